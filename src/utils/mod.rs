pub mod serial;
pub mod spreadsheet;

pub use serial::{extract_serial_number, is_valid_full_serial_length, is_valid_serial_format};
