use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset is missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid {column} value on line {line}: {value:?}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Unknown payer: {0}")]
    UnknownPayer(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ClaimError>;
