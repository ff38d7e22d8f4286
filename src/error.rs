use thiserror::Error;

/// Errors surfaced by the portal client.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-success HTTP status; carries the message extracted from the body.
    #[error("{0}")]
    Request(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The message shown to the user for this failure.
    pub fn message(&self) -> String {
        match self {
            Error::Request(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
