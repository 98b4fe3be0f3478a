use thiserror::Error;

/// estimerge error types
#[derive(Error, Debug)]
pub enum EstimergeError {
    /// Document cannot be read as an estimate (not an object, no `services` array)
    #[error("schema error: {0}")]
    Schema(String),

    /// Merge was called with nothing to merge
    #[error("no estimates to merge")]
    EmptyInput,

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode JSON or expand an input pattern
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for EstimergeError {
    fn from(err: serde_json::Error) -> Self {
        EstimergeError::Parse(err.to_string())
    }
}

/// Result type alias for estimerge
pub type Result<T> = std::result::Result<T, EstimergeError>;
