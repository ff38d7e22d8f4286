use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::api::types::{SerialBulkImportRequest, SerialImportItem};
use crate::error::Result;

use super::serial::extract_serial_number;

/// Column holding the full serial number in serial import sheets.
pub const FULL_SERIAL_COLUMN: &str = "full_serial_number";

/// One data row keyed by header name. Missing cells are empty strings.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sheet {
    /// First line used as column names.
    Rows(Vec<Row>),
    /// Raw cells, first line included.
    Cells(Vec<Vec<String>>),
}

impl Sheet {
    pub fn len(&self) -> usize {
        match self {
            Sheet::Rows(rows) => rows.len(),
            Sheet::Cells(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read CSV data from `reader`.
pub fn read_rows<R: Read>(reader: R, has_header: bool) -> Result<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_reader(reader);

    if !has_header {
        let mut cells = Vec::new();
        for record in rdr.records() {
            let record = record?;
            cells.push(record.iter().map(str::to_string).collect());
        }
        return Ok(Sheet::Cells(cells));
    }

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }
    Ok(Sheet::Rows(rows))
}

pub fn read_file(path: &Path, has_header: bool) -> Result<Sheet> {
    let file = File::open(path)?;
    read_rows(file, has_header)
}

/// Outcome of mapping sheet rows to serial import items.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SerialImport {
    pub items: Vec<SerialImportItem>,
    /// `(row index, full serial value)` for rows whose serial is not derivable.
    pub rejected: Vec<(usize, String)>,
}

impl SerialImport {
    pub fn into_request(self) -> SerialBulkImportRequest {
        SerialBulkImportRequest { serials: self.items }
    }
}

/// Build import items for `product_id` from rows carrying a full serial column.
pub fn serial_import_items(rows: &[Row], product_id: &str) -> SerialImport {
    let mut import = SerialImport::default();

    for (index, row) in rows.iter().enumerate() {
        let full = row
            .get(FULL_SERIAL_COLUMN)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        match extract_serial_number(&full) {
            Some(serial_number) => import.items.push(SerialImportItem {
                product_id: product_id.to_string(),
                serial_number,
                full_serial_number: full,
            }),
            None => {
                log::debug!("Row {} has no derivable serial: {:?}", index, full);
                import.rejected.push((index, full));
            }
        }
    }

    import
}
