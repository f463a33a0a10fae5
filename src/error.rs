use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResitError {
    #[error("{0}")]
    Validation(String),

    #[error("No receipt found: {0}")]
    NotFound(String),

    #[error("'{key}' matches {count} receipts; use the receipt ID from `resit history list`")]
    Ambiguous { key: String, count: usize },

    #[error("Could not write receipt data: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not write {path}: {source}")]
    Export {
        path: String,
        source: std::io::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Cancelled(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ResitError>;
