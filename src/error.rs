use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Workbook decode error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Delimited text decode error: {0}")]
    Delimited(#[from] csv::Error),

    #[error("Invalid hourly rate {0}: must be a finite number greater than zero")]
    InvalidHourlyRate(f64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
