//! Common error types for TLAB

use thiserror::Error;

/// Common result type for TLAB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TLAB services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backing store could not be reached or refused the operation
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error comes from the backing store rather than the caller.
    ///
    /// These abort the current request; nothing is retried.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::Database(_) | Error::StorageUnavailable(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", err))
    }
}
