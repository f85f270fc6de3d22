//! # Money Module
//!
//! Provides `Money` (integer minor units) and `Percent` (basis points).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A till that compares tendered >= net total with floats needs an        │
//! │  epsilon. With integer cents the comparison is exact and the            │
//! │  tolerance is zero.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sign Symmetry
//! Returns carry negative amounts. Percentages are applied with
//! round-half-away-from-zero, so a 10% discount on -$10.05 is exactly the
//! mirror of a 10% discount on $10.05.
//!
//! ```rust
//! use medix_core::money::{Money, Percent};
//!
//! let sale = Money::from_cents(1005);
//! let refund = Money::from_cents(-1005);
//! let ten = Percent::from_bps(1000);
//!
//! assert_eq!(sale.percent(ten).cents(), 101);
//! assert_eq!(refund.percent(ten).cents(), -101);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Divides with rounding half away from zero.
///
/// `denominator` must be non-zero; callers guard it.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let negative = (numerator < 0) != (denominator < 0);
    let (n, d) = (numerator.abs(), denominator.abs());
    let rounded = (2 * n + d) / (2 * d);
    if negative {
        -rounded
    } else {
        rounded
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds, return lines, and discount adjustments are
///   negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Batch.selling_price ──► CartLine.base_rate ──► line_total ──► gross_total
///                                                                   │
///                              Adjustment ──────────────────────────┤
///                                                                   ▼
///                        tendered ──► PaymentReconciler ◄──── net_total
///                                            │
///                                            ▼
///                                         change
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a signed quantity.
    ///
    /// ```rust
    /// use medix_core::money::Money;
    ///
    /// let rate = Money::from_cents(299);
    /// assert_eq!(rate.multiply_quantity(3).cents(), 897);
    /// assert_eq!(rate.multiply_quantity(-3).cents(), -897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `percent` of this amount, rounded half away from zero.
    pub fn percent(&self, percent: Percent) -> Money {
        let cents = div_round(self.0 as i128 * percent.bps() as i128, 10_000);
        Money(cents as i64)
    }

    /// Divides by a non-zero quantity, rounded half away from zero.
    ///
    /// Returns `None` for a zero quantity.
    pub fn per_unit(&self, qty: i64) -> Option<Money> {
        if qty == 0 {
            return None;
        }
        Some(Money(div_round(self.0 as i128, qty as i128) as i64))
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub fn floor_zero(self) -> Money {
        self.max(Money::zero())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Percent Type
// =============================================================================

/// A signed percentage in basis points (1000 = 10%).
///
/// Used for line discounts in Percent mode and for percentage adjustments,
/// where a negative value is a discount and a positive one a surcharge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Percent(i64);

impl Percent {
    /// One hundred percent.
    pub const FULL: Percent = Percent(10_000);

    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a whole-number percent (10 → 10%).
    #[inline]
    pub const fn from_whole(pct: i64) -> Self {
        Percent(pct * 100)
    }

    /// Returns `numerator / denominator` as a percentage, rounded half away
    /// from zero. `None` when the denominator is zero.
    pub fn from_ratio(numerator: Money, denominator: Money) -> Option<Percent> {
        if denominator.is_zero() {
            return None;
        }
        let bps = div_round(numerator.cents() as i128 * 10_000, denominator.cents() as i128);
        Some(Percent(bps as i64))
    }

    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}%", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
        assert_eq!(Percent::from_bps(1050).to_string(), "10.50%");
        assert_eq!(Percent::from_bps(-250).to_string(), "-2.50%");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, -b].into_iter().sum();
        assert_eq!(total, a);
    }

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        let ten = Percent::from_whole(10);
        assert_eq!(Money::from_cents(10_000).percent(ten).cents(), 1000);
        // 1005 × 10% = 100.5 → 101
        assert_eq!(Money::from_cents(1005).percent(ten).cents(), 101);
        assert_eq!(Money::from_cents(-1005).percent(ten).cents(), -101);
        assert_eq!(Money::from_cents(1004).percent(ten).cents(), 100);
    }

    #[test]
    fn test_percent_from_ratio() {
        let pct = Percent::from_ratio(Money::from_cents(10), Money::from_cents(100)).unwrap();
        assert_eq!(pct.bps(), 1000);

        // One third → 33.33%
        let third = Percent::from_ratio(Money::from_cents(1), Money::from_cents(3)).unwrap();
        assert_eq!(third.bps(), 3333);

        assert!(Percent::from_ratio(Money::from_cents(1), Money::zero()).is_none());
    }

    #[test]
    fn test_per_unit() {
        assert_eq!(Money::from_cents(1000).per_unit(4), Some(Money::from_cents(250)));
        assert_eq!(Money::from_cents(-1000).per_unit(-4), Some(Money::from_cents(250)));
        assert_eq!(Money::from_cents(1000).per_unit(0), None);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_cents(-5).floor_zero(), Money::zero());
        assert_eq!(Money::from_cents(5).floor_zero(), Money::from_cents(5));
    }
}
