//! Error types for bucketfs

use thiserror::Error;

/// Result type alias for bucket operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed backend-native error, propagated to callers unmodified
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in bucket operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Invalid glob pattern: {0:?}")]
    InvalidPattern(String),

    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(BackendError),
}

impl Error {
    /// Whether this error reports a missing blob
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound(_))
    }
}
