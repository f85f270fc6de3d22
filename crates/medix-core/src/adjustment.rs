//! # Adjustment Calculator
//!
//! One signed amount applied once per transaction on top of the gross total.
//!
//! ```text
//!   set_percent(-10%) with gross 200.00  ──►  amount = -20.00  (snapshot)
//!   gross later changes to 300.00        ──►  amount stays -20.00
//!   set_amount(+5.00)                    ──►  amount = +5.00   (overwrites)
//!
//!   net_total = gross_total + amount
//! ```
//!
//! Negative amounts are discounts, positive amounts surcharges.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percent};

/// The stored transaction-level adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustment {
    amount: Money,
    /// The percentage the amount was derived from, kept for display only.
    percent: Option<Percent>,
}

impl Adjustment {
    pub fn none() -> Self {
        Adjustment::default()
    }

    /// Applies `percent` to the gross total as of now.
    ///
    /// ## Example
    /// ```rust
    /// use medix_core::adjustment::Adjustment;
    /// use medix_core::money::{Money, Percent};
    ///
    /// let adj = Adjustment::from_percent(Money::from_cents(20_000), Percent::from_whole(-10));
    /// assert_eq!(adj.amount(), Money::from_cents(-2_000));
    /// ```
    pub fn from_percent(gross_total: Money, percent: Percent) -> Self {
        Adjustment {
            amount: gross_total.percent(percent),
            percent: Some(percent),
        }
    }

    /// A directly entered signed amount.
    pub fn from_amount(amount: Money) -> Self {
        Adjustment {
            amount,
            percent: None,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn percent(&self) -> Option<Percent> {
        self.percent
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// `gross_total + amount`.
    #[inline]
    pub fn net_total(&self, gross_total: Money) -> Money {
        gross_total + self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_is_a_snapshot() {
        let adj = Adjustment::from_percent(Money::from_cents(20_000), Percent::from_whole(-10));
        assert_eq!(adj.amount(), Money::from_cents(-2_000));
        // Gross grows, adjustment does not follow.
        assert_eq!(adj.net_total(Money::from_cents(30_000)), Money::from_cents(28_000));
        assert_eq!(adj.percent(), Some(Percent::from_whole(-10)));
    }

    #[test]
    fn test_amount_overwrites() {
        let adj = Adjustment::from_amount(Money::from_cents(-2_000));
        assert_eq!(adj.net_total(Money::from_cents(9_000)), Money::from_cents(7_000));
        assert_eq!(adj.percent(), None);

        let surcharge = Adjustment::from_amount(Money::from_cents(500));
        assert_eq!(surcharge.net_total(Money::from_cents(1_000)), Money::from_cents(1_500));
    }

    #[test]
    fn test_none_is_neutral() {
        let adj = Adjustment::none();
        assert!(adj.is_zero());
        assert_eq!(adj.net_total(Money::from_cents(123)), Money::from_cents(123));
    }
}
