//! Common error types for mnemo

use thiserror::Error;

/// Common result type for mnemo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds across the service
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

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A learning set with the given name already exists
    #[error("Learning set '{0}' already exists")]
    AlreadyExists(String),

    /// Upstream AI or TTS provider failure (network, non-2xx, bad envelope)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model output could not be parsed as JSON; the raw response is retained
    /// for operator inspection
    #[error("Failed to parse model output as JSON: {message}")]
    Parse { message: String, raw: String },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("JSON serialization: {e}"))
    }
}
