//! # API Error Type
//!
//! Unified error type for terminal operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  Operator action ──► Terminal method ──► Result<T, ApiError>            │
//! │                             │                                           │
//! │        ┌────────────────────┼────────────────────┐                      │
//! │        ▼                    ▼                    ▼                      │
//! │   CoreError            ClientError          ConfigError                 │
//! │   (cart rules)         (service call)       (local record)              │
//! │        │                    │                    │                      │
//! │        └────────────────────┴────────────────────┘                      │
//! │                             │                                           │
//! │                             ▼                                           │
//! │              ApiError { code, message } ──► transient notification     │
//! │                                                                         │
//! │  Every failure leaves cart and deck as they were, so retry is safe.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use medix_client::ClientError;
use medix_core::{CoreError, ValidationError};

use crate::state::ConfigError;

/// Error returned from terminal operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Only 10 units of LOT-7 in stock, 15 requested"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the notification
    pub message: String,
}

/// Error codes for terminal responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Line, hold or transaction not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Sale would exceed cached batch stock
    InsufficientStock,

    /// Hold or commit with no lines
    EmptyCart,

    /// Invoicing service call failed
    NetworkError,

    /// Controlled product refused in Lock mode
    ControlledProduct,

    /// Action not allowed in the current lifecycle state
    InvalidState,

    /// Local config record could not be read or written
    ConfigError,

    /// Unexpected failure
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts engine errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                batch,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} units of {} in stock, {} requested",
                    available, batch, requested
                ),
            ),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, "Cart is empty"),
            CoreError::LineNotFound(key) => ApiError::not_found("Cart line", &key),
            CoreError::ControlledProductLocked { product } => ApiError::new(
                ErrorCode::ControlledProduct,
                format!("{} is a controlled substance and is locked on this terminal", product),
            ),
            e @ CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidState, e.to_string())
            }
            CoreError::HoldNotFound { index, .. } => {
                ApiError::not_found("Held transaction", &index.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts invoicing service errors to API errors.
///
/// The operator gets a generic message; the detail goes to the log.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(detail) => {
                tracing::warn!("Invoicing service returned not found: {}", detail);
                ApiError::new(ErrorCode::NotFound, "Transaction not found")
            }
            ClientError::Validation(detail) => {
                tracing::error!("Invoicing service rejected request: {}", detail);
                ApiError::new(ErrorCode::NetworkError, "Invoicing service rejected the request")
            }
            ClientError::Http(e) => {
                tracing::error!("Invoicing service unreachable: {}", e);
                ApiError::new(ErrorCode::NetworkError, "Invoicing service unreachable")
            }
            ClientError::Service { status, message } => {
                tracing::error!(status, "Invoicing service error: {}", message);
                ApiError::new(ErrorCode::NetworkError, "Invoicing service error")
            }
            ClientError::InvalidResponse(detail) => {
                tracing::error!("Invalid response from invoicing service: {}", detail);
                ApiError::new(ErrorCode::NetworkError, "Invalid response from invoicing service")
            }
            ClientError::Serialization(e) => {
                tracing::error!("Failed to decode invoicing response: {}", e);
                ApiError::new(ErrorCode::NetworkError, "Invalid response from invoicing service")
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(msg) => ApiError::new(ErrorCode::ConfigError, msg),
            e => {
                tracing::error!("Config store failed: {}", e);
                ApiError::new(ErrorCode::ConfigError, "Could not save terminal settings")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_code() {
        let err: ApiError = CoreError::InsufficientStock {
            batch: "LOT-7".to_string(),
            available: 10,
            requested: 15,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("15"));
    }

    #[test]
    fn test_client_error_hides_detail() {
        let err: ApiError = ClientError::Service {
            status: 500,
            message: "stack trace at line 42".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(!err.message.contains("42"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::new(ErrorCode::EmptyCart, "Cart is empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert_eq!(json["message"], "Cart is empty");
        assert_eq!(err.to_string(), "[EmptyCart] Cart is empty");
    }

    #[test]
    fn test_validation_passes_message_through() {
        let err: ApiError = CoreError::from(ValidationError::required("batch")).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "batch is required");
    }
}
