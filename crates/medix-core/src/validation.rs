//! # Validation Module
//!
//! Input validation for cart and checkout operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal UI                                                  │
//! │  └── Numeric fields, unit picker only shows Pack when factor > 1       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Quantity, discount, and cart-size rules, checked before any       │
//! │      cart state is touched                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Invoicing service                                            │
//! │  └── Authoritative stock and persistence                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Percent};
use crate::types::DiscountMode;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an operator-entered quantity.
///
/// ## Rules
/// - Must be positive (> 0); the cart applies the return sign itself
/// - Must not exceed MAX_LINE_QUANTITY
///
/// ## User Workflow
/// ```text
/// Operator types quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?     → "quantity must be positive"
///      ├── qty > 9999?   → "quantity must be between 1 and 9999"
///      └── OK            → cart applies sign and checks stock
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a merged line quantity (signed) against the per-line maximum.
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty.abs() > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a line discount figure for the active discount mode.
///
/// ## Rules
/// - Percent mode: 0 to 100% (0..=10_000 bps)
/// - Value mode: 0 up to the line's effective rate (cents per operator unit)
pub fn validate_discount(
    mode: DiscountMode,
    discount: i64,
    effective_rate: Money,
) -> ValidationResult<()> {
    let max = max_discount(mode, effective_rate);

    if discount < 0 || discount > max {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Largest discount figure allowed for a line at `effective_rate`.
pub fn max_discount(mode: DiscountMode, effective_rate: Money) -> i64 {
    match mode {
        DiscountMode::Percent => Percent::FULL.bps(),
        DiscountMode::Value => effective_rate.cents().max(0),
    }
}

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

/// Validates a tendered amount.
///
/// ## Rules
/// - Must not be negative (zero is fine for card and credit payments)
pub fn validate_tendered(tendered: Money) -> ValidationResult<()> {
    if tendered.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "tendered".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_line_quantity_is_sign_agnostic() {
        assert!(validate_line_quantity(-MAX_LINE_QUANTITY).is_ok());
        assert!(validate_line_quantity(-MAX_LINE_QUANTITY - 1).is_err());
    }

    #[test]
    fn test_validate_discount_percent() {
        let rate = Money::from_cents(500);
        assert!(validate_discount(DiscountMode::Percent, 0, rate).is_ok());
        assert!(validate_discount(DiscountMode::Percent, 10_000, rate).is_ok());
        assert!(validate_discount(DiscountMode::Percent, 10_001, rate).is_err());
        assert!(validate_discount(DiscountMode::Percent, -1, rate).is_err());
    }

    #[test]
    fn test_validate_discount_value() {
        let rate = Money::from_cents(500);
        assert!(validate_discount(DiscountMode::Value, 500, rate).is_ok());
        assert!(validate_discount(DiscountMode::Value, 501, rate).is_err());
    }

    #[test]
    fn test_max_discount_follows_mode() {
        let rate = Money::from_cents(100);
        assert_eq!(max_discount(DiscountMode::Percent, rate), 10_000);
        assert_eq!(max_discount(DiscountMode::Value, rate), 100);
        assert_eq!(max_discount(DiscountMode::Value, Money::from_cents(-5)), 0);
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_validate_tendered() {
        assert!(validate_tendered(Money::zero()).is_ok());
        assert!(validate_tendered(Money::from_cents(-1)).is_err());
    }
}
