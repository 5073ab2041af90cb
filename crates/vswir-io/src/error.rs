use thiserror::Error;

/// Result type local to vswir-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse Parquet data: {0}")]
    Decode(String),

    #[error("malformed table: {0}")]
    Table(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] vswir_core::Error),
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Error::Decode(e.to_string())
    }
}
