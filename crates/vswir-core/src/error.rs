use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("cannot compress an empty id list into ranges")]
    EmptyInput,

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("view '{view}' has no filter field '{field}'")]
    UnknownFilter { view: String, field: String },

    /// User-facing input validation; reported before any request is made.
    #[error("{0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
