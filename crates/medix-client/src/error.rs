//! Client error types

use thiserror::Error;

/// Invoicing service failure.
///
/// Every variant surfaces to the operator as a network error; the detail is
/// for the logs.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service rejected the payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-success status, or the service is unreachable
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// True when the service itself could not be reached or failed, as
    /// opposed to rejecting the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Service { .. })
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
