use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Cannot parse date: '{0}'")]
    Date(String),

    #[error("Cannot parse amount: '{0}'")]
    Amount(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LedgerizeError>;
