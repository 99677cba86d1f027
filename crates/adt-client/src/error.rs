//! # Client Error Types
//!
//! Transport-level failures. A remote call that completes with a non-2xx
//! status is *not* an error at this layer; it is a [`crate::RemoteResponse`]
//! the caller classifies. These variants cover calls that never produced a
//! usable response.

use adt_shared::{Classification, ErrorClassifier, ErrorKind};
use thiserror::Error;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session handshake failed: {status} - {message}")]
    HandshakeFailed { status: u16, message: String },

    #[error("Timeout waiting for operation: {operation} after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a handshake error from the remote status and body
    pub fn handshake_failed(status: u16, message: impl Into<String>) -> Self {
        Self::HandshakeFailed {
            status,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::HttpError(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Map a transport failure into the shared taxonomy.
    pub fn classify(&self, classifier: &ErrorClassifier) -> Classification {
        match self {
            ClientError::HandshakeFailed { status, message } => {
                classifier.classify(*status, Some(message))
            }
            ClientError::HttpError(e) => match e.status() {
                Some(status) => classifier.classify(status.as_u16(), Some(&e.to_string())),
                None => Classification {
                    kind: ErrorKind::Unknown,
                    message: self.to_string(),
                },
            },
            _ => Classification {
                kind: ErrorKind::Unknown,
                message: self.to_string(),
            },
        }
    }
}
