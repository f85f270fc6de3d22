//! # Error Types
//!
//! Domain-specific error types for medix-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medix-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  medix-client errors (separate crate)                                  │
//! │  └── ClientError      - Invoicing service failures                     │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - Transient notification the operator sees       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                         ClientError ─┴──► ApiError → Operator          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Every failing operation leaves cart and deck exactly as they were
//! 2. Include context in error messages (batch, quantities, line key)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::lifecycle::{LifecycleAction, TransactionState};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the transaction engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested units exceed the cached batch availability.
    ///
    /// ## When This Occurs
    /// Sale carts only. A return never deducts stock, so the check is skipped.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (3 × Pack of 5)
    ///      │
    ///      ▼
    /// units consumed = 15, batch available = 10
    ///      │
    ///      ▼
    /// InsufficientStock { batch: "LOT-7", available: 10, requested: 15 }
    ///      │
    ///      ▼
    /// Operator sees: "Only 10 units of LOT-7 in stock"
    /// ```
    #[error("Insufficient stock for batch {batch}: available {available}, requested {requested}")]
    InsufficientStock {
        batch: String,
        available: i64,
        requested: i64,
    },

    /// Hold or commit attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// No line exists for the given (batch, unit) key.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// A control-flagged product was added while the terminal is in Lock mode.
    #[error("Product {product} is a controlled substance and cannot be sold from this terminal")]
    ControlledProductLocked { product: String },

    /// The lifecycle does not allow the action from its current state.
    #[error("Cannot {action:?} while transaction is {state:?}")]
    InvalidTransition {
        state: TransactionState,
        action: LifecycleAction,
    },

    /// The deck has no hold at the requested position.
    #[error("No held transaction at index {index} (deck holds {count})")]
    HoldNotFound { index: isize, count: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state is touched, so a rejected edit is always a no-op.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required selection is missing.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is not permitted in the current context.
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },

    /// Cash tendered does not cover the net total.
    #[error("Tendered {tendered} does not cover net total {net_total}")]
    InsufficientTender { tendered: String, net_total: String },
}

impl ValidationError {
    /// Creates a `Required` error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a `NotAllowed` error for a field.
    pub fn not_allowed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::NotAllowed {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            batch: "LOT-7".to_string(),
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for batch LOT-7: available 10, requested 15"
        );
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("batch");
        assert_eq!(err.to_string(), "batch is required");

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 10000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("payment method").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
