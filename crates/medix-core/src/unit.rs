//! # Unit Conversion
//!
//! Resolves the effective rate and the stock consumed by a line sold in
//! base or pack units.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product: Paracetamol 500mg, 1 strip = 10 tablets, 2.00 per tablet      │
//! │                                                                         │
//! │   unit   qty   effective rate        units consumed                     │
//! │   ────   ───   ──────────────        ──────────────                     │
//! │   Base    3    2.00                  3                                  │
//! │   Pack    3    2.00 × 10 = 20.00     3 × 10 = 30                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Toggle Rule
//! Switching a line between Base and Pack keeps the operator-visible
//! quantity. "3 tablets" becomes "3 strips", not "0.3 strips": only the
//! effective rate and the units consumed change, so the line total jumps by
//! the factor. Tills built against the same invoicing service rely on this.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::UnitType;

/// Base units per pack unit. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
pub struct ConversionFactor(u32);

impl ConversionFactor {
    /// A product without a pack unit.
    pub const NONE: ConversionFactor = ConversionFactor(1);

    /// Creates a factor, rejecting zero.
    pub fn new(factor: u32) -> Result<Self, ValidationError> {
        if factor == 0 {
            return Err(ValidationError::MustBePositive {
                field: "conversion factor".to_string(),
            });
        }
        Ok(ConversionFactor(factor))
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Pack selection is only offered when the factor is above one.
    #[inline]
    pub const fn offers_pack(&self) -> bool {
        self.0 > 1
    }

    /// Base units per operator unit for the given unit type.
    #[inline]
    pub const fn multiplier(&self, unit: UnitType) -> i64 {
        match unit {
            UnitType::Base => 1,
            UnitType::Pack => self.0 as i64,
        }
    }

    /// `quantity × (Pack ? factor : 1)`. Also the base-unit quantity sent
    /// to the invoicing service.
    #[inline]
    pub const fn units_consumed(&self, quantity: i64, unit: UnitType) -> i64 {
        quantity * self.multiplier(unit)
    }

    /// `base_rate × (Pack ? factor : 1)`.
    #[inline]
    pub fn effective_rate(&self, base_rate: Money, unit: UnitType) -> Money {
        base_rate * self.multiplier(unit)
    }

    /// Rejects Pack for products that have no pack unit.
    pub fn check_unit(&self, unit: UnitType) -> Result<(), ValidationError> {
        if unit == UnitType::Pack && !self.offers_pack() {
            return Err(ValidationError::not_allowed(
                "unit",
                "product has no pack unit",
            ));
        }
        Ok(())
    }

    /// Picks the unit for a new line: the requested one, else the session
    /// default, falling back to Base when the product has no pack.
    pub fn resolve_unit(&self, requested: Option<UnitType>, default: UnitType) -> UnitType {
        match requested {
            Some(unit) => unit,
            None if default == UnitType::Pack && !self.offers_pack() => UnitType::Base,
            None => default,
        }
    }
}

impl Default for ConversionFactor {
    fn default() -> Self {
        ConversionFactor::NONE
    }
}

impl fmt::Display for ConversionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "×{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ConversionFactor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u32::deserialize(deserializer)?;
        ConversionFactor::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_rejects_zero() {
        assert!(ConversionFactor::new(0).is_err());
        assert_eq!(ConversionFactor::new(5).unwrap().get(), 5);
        assert!(serde_json::from_str::<ConversionFactor>("0").is_err());
        assert_eq!(
            serde_json::from_str::<ConversionFactor>("12").unwrap().get(),
            12
        );
    }

    #[test]
    fn test_units_consumed_and_rate() {
        let factor = ConversionFactor::new(5).unwrap();
        assert_eq!(factor.units_consumed(3, UnitType::Pack), 15);
        assert_eq!(factor.units_consumed(3, UnitType::Base), 3);
        assert_eq!(factor.units_consumed(-3, UnitType::Pack), -15);

        let rate = Money::from_cents(1000);
        assert_eq!(factor.effective_rate(rate, UnitType::Pack).cents(), 5000);
        assert_eq!(factor.effective_rate(rate, UnitType::Base).cents(), 1000);
    }

    #[test]
    fn test_pack_only_offered_above_one() {
        assert!(!ConversionFactor::NONE.offers_pack());
        assert!(ConversionFactor::NONE.check_unit(UnitType::Pack).is_err());
        assert!(ConversionFactor::NONE.check_unit(UnitType::Base).is_ok());
        assert!(ConversionFactor::new(2).unwrap().check_unit(UnitType::Pack).is_ok());
    }

    #[test]
    fn test_resolve_unit_falls_back_to_base() {
        let none = ConversionFactor::NONE;
        let strip = ConversionFactor::new(10).unwrap();

        assert_eq!(none.resolve_unit(None, UnitType::Pack), UnitType::Base);
        assert_eq!(strip.resolve_unit(None, UnitType::Pack), UnitType::Pack);
        assert_eq!(strip.resolve_unit(Some(UnitType::Base), UnitType::Pack), UnitType::Base);
    }
}
