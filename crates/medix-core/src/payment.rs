//! # Payment Reconciler
//!
//! Classifies a transaction from its net total and computes change.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  net_total ──► classify() ──► Sale (≥ 0) | Return (< 0)                  │
//! │                                                                         │
//! │  PaymentInfo { method, tendered }                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  can_checkout()                                                         │
//! │  ├── non-cash                 → always                                  │
//! │  └── cash: tendered ≥ net     → yes, else InsufficientTender            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  change() = cash ? max(0, tendered − net) : 0                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are integer cents, so the tender comparison is exact.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, TransactionKind};
use crate::validation::validate_tendered;

/// `net_total < 0` is a return, anything else a sale.
///
/// Line signs do not matter: a sale whose adjustment pushes the net below
/// zero is still a return.
#[inline]
pub fn classify(net_total: Money) -> TransactionKind {
    if net_total.is_negative() {
        TransactionKind::Return
    } else {
        TransactionKind::Sale
    }
}

/// Cash: `max(0, tendered − net_total)`. Any other method: zero.
pub fn change(tendered: Money, net_total: Money, method: PaymentMethod) -> Money {
    if method.is_cash() {
        (tendered - net_total).floor_zero()
    } else {
        Money::zero()
    }
}

/// Non-cash methods always pass; cash must cover the net total.
pub fn can_checkout(tendered: Money, net_total: Money, method: PaymentMethod) -> bool {
    !method.is_cash() || tendered >= net_total
}

/// What the operator entered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub tendered: Money,
}

impl PaymentInfo {
    pub fn cash(tendered: Money) -> Self {
        PaymentInfo {
            method: PaymentMethod::Cash,
            tendered,
        }
    }

    pub fn non_cash(method: PaymentMethod) -> Self {
        PaymentInfo {
            method,
            tendered: Money::zero(),
        }
    }
}

/// The reconciled outcome of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    pub kind: TransactionKind,
    pub method: PaymentMethod,
    pub net_total: Money,
    pub tendered: Money,
    pub change: Money,
}

/// Reconciles a payment against the net total.
///
/// ## Errors
/// - `OutOfRange` for a negative tender
/// - `InsufficientTender` when cash does not cover the net total
pub fn settle(net_total: Money, payment: &PaymentInfo) -> CoreResult<Settlement> {
    validate_tendered(payment.tendered)?;

    if !can_checkout(payment.tendered, net_total, payment.method) {
        return Err(ValidationError::InsufficientTender {
            tendered: payment.tendered.to_string(),
            net_total: net_total.to_string(),
        }
        .into());
    }

    Ok(Settlement {
        kind: classify(net_total),
        method: payment.method,
        net_total,
        tendered: payment.tendered,
        change: change(payment.tendered, net_total, payment.method),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_classify() {
        assert_eq!(classify(Money::from_cents(1)), TransactionKind::Sale);
        assert_eq!(classify(Money::zero()), TransactionKind::Sale);
        assert_eq!(classify(Money::from_cents(-1_500)), TransactionKind::Return);
    }

    #[test]
    fn test_change() {
        let net = Money::from_cents(7_000);
        assert_eq!(
            change(Money::from_cents(10_000), net, PaymentMethod::Cash),
            Money::from_cents(3_000)
        );
        assert_eq!(change(Money::from_cents(5_000), net, PaymentMethod::Cash), Money::zero());
        assert_eq!(
            change(Money::from_cents(10_000), net, PaymentMethod::ExternalCard),
            Money::zero()
        );
        assert_eq!(
            change(Money::from_cents(10_000), net, PaymentMethod::Credit),
            Money::zero()
        );
    }

    #[test]
    fn test_can_checkout() {
        let net = Money::from_cents(7_000);
        assert!(can_checkout(net, net, PaymentMethod::Cash));
        assert!(!can_checkout(Money::from_cents(6_999), net, PaymentMethod::Cash));
        assert!(can_checkout(Money::zero(), net, PaymentMethod::Credit));
    }

    #[test]
    fn test_settle_refund_in_cash() {
        let settlement = settle(Money::from_cents(-1_500), &PaymentInfo::cash(Money::zero())).unwrap();
        assert_eq!(settlement.kind, TransactionKind::Return);
        assert_eq!(settlement.change, Money::from_cents(1_500));
    }

    #[test]
    fn test_settle_rejects_short_cash() {
        let err = settle(Money::from_cents(7_000), &PaymentInfo::cash(Money::from_cents(100)))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InsufficientTender { .. })
        ));
    }

    #[test]
    fn test_settle_rejects_negative_tender() {
        assert!(settle(Money::zero(), &PaymentInfo::cash(Money::from_cents(-1))).is_err());
    }
}
