//! Common error types for the OmniverseTV backend

use thiserror::Error;

/// Common result type for OmniverseTV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the OmniverseTV services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Cache (Redis) operation error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Job queue operation error
    #[error("Queue error: {0}")]
    Queue(String),

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

    /// Translation provider did not answer within the deadline
    #[error("Translation provider timed out after {0} seconds")]
    ProviderTimeout(u64),

    /// Translation provider answered with a non-success status
    #[error("Translation provider error: {status} - {message}")]
    ProviderResponse { status: u16, message: String },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a failed translation job should be handed back to the queue
    /// for another attempt. Provider-side failures are transient by nature;
    /// bad input never heals on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ProviderTimeout(_)
                | Error::ProviderResponse { .. }
                | Error::Cache(_)
                | Error::Queue(_)
                | Error::Database(_)
        )
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON serialization error: {}", err))
    }
}
