//! # Shared Error Types
//!
//! Errors raised by the shared layer itself: configuration loading, payload
//! serialization and input validation. Remote failures are never represented
//! here; they are classified into [`crate::ErrorKind`] and travel inside step
//! outcomes.

use thiserror::Error;

/// Shared operation result type
pub type AdtResult<T> = Result<T, AdtError>;

/// Error types for the shared layer
#[derive(Debug, Error)]
pub enum AdtError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON serialization/deserialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown object kind: {0}")]
    UnknownObjectKind(String),

    #[error("Logging initialization failed: {0}")]
    LoggingError(String),
}

impl AdtError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<config::ConfigError> for AdtError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
