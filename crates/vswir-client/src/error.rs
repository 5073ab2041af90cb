use thiserror::Error;

/// Result type local to vswir-client.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Network or transport failure, surfaced verbatim.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Expected absence (e.g. a job the status service does not know yet).
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    /// User-facing input problem, reported before any request is sent.
    #[error("{0}")]
    Validation(String),

    #[error("No pixel IDs found")]
    NoPixelIds,

    #[error("view '{0}' does not support spectra extraction")]
    NotExtractable(String),

    /// Payload could not be decoded or written out.
    #[error(transparent)]
    Decode(#[from] vswir_io::Error),

    #[error(transparent)]
    Core(#[from] vswir_core::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Malformed(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Core(vswir_core::Error::Config(format!("invalid API URL: {e}")))
    }
}
