//! # Cart Engine
//!
//! Owns the lines of the transaction currently being built.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action        Engine Call              Line Change            │
//! │  ───────────────        ───────────              ───────────            │
//! │                                                                         │
//! │  Pick batch ──────────► add_line() ────────────► merge or push          │
//! │                          (stock check on sale)                          │
//! │                                                                         │
//! │  Edit qty/unit/disc ──► update_line() ─────────► in place / merge       │
//! │                          (stock check if growing)                       │
//! │                                                                         │
//! │  Remove ──────────────► remove_line() ─────────► lines.remove(i)        │
//! │                                                                         │
//! │  Clear ───────────────► clear() ───────────────► lines.clear()          │
//! │                                                                         │
//! │  Every failing call returns before touching `lines`.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Lines are keyed by (batch, unit). Picking the same batch again in the same
//! unit adds to the existing quantity; picking it in the other unit creates a
//! second, independent line.
//!
//! ## Sign Convention
//! The operator always types positive quantities. The cart applies the sign
//! of its [`TransactionKind`]: positive for a sale, negative for a return.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Percent};
use crate::stock::StockSnapshot;
use crate::types::{
    Batch, ControlDrugMode, DiscountMode, Product, SessionConfig, TransactionKind, UnitType,
};
use crate::unit::ConversionFactor;
use crate::validation::{
    max_discount, validate_cart_size, validate_discount, validate_line_quantity,
    validate_quantity,
};

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line: (batch, unit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineKey {
    pub batch_id: String,
    pub unit: UnitType,
}

impl LineKey {
    pub fn new(batch_id: impl Into<String>, unit: UnitType) -> Self {
        LineKey {
            batch_id: batch_id.into(),
            unit,
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.batch_id, self.unit)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the active transaction.
///
/// Product data (name, factor, control flag) is frozen when the line is
/// created so totals stay stable if the stock snapshot is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub product_name: String,
    pub batch_id: String,
    pub unit: UnitType,

    /// Operator-unit quantity, signed by the transaction kind.
    pub quantity: i64,

    /// Price per base unit.
    pub base_rate: Money,

    /// Hundredths of the operator's discount figure: basis points in
    /// Percent mode, cents per operator unit in Value mode.
    pub discount: i64,

    pub factor: ConversionFactor,
    pub controlled: bool,
}

impl CartLine {
    /// Creates a line for a product/batch pair with no discount.
    pub fn new(product: &Product, batch: &Batch, unit: UnitType, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            batch_id: batch.id.clone(),
            unit,
            quantity,
            base_rate: batch.selling_price,
            discount: 0,
            factor: product.pack_factor,
            controlled: product.controlled,
        }
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.batch_id.clone(), self.unit)
    }

    /// `base_rate` for Base, `base_rate × factor` for Pack.
    #[inline]
    pub fn effective_rate(&self) -> Money {
        self.factor.effective_rate(self.base_rate, self.unit)
    }

    /// Base units this line takes from its batch.
    #[inline]
    pub fn units_consumed(&self) -> i64 {
        self.factor.units_consumed(self.quantity, self.unit)
    }

    /// `quantity × effective_rate`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.effective_rate().multiply_quantity(self.quantity)
    }

    /// Discount amount under the given mode. Carries the quantity's sign.
    pub fn discount_amount(&self, mode: DiscountMode) -> Money {
        match mode {
            DiscountMode::Percent => self.subtotal().percent(Percent::from_bps(self.discount)),
            DiscountMode::Value => Money::from_cents(self.discount).multiply_quantity(self.quantity),
        }
    }

    /// `subtotal − discount`.
    ///
    /// ## Example
    /// ```text
    /// qty 2 × rate 50.00 = 100.00, discount 10% = 10.00  →  90.00
    /// qty -2 × rate 50.00 = -100.00, discount 10% = -10.00  →  -90.00
    /// ```
    pub fn total(&self, mode: DiscountMode) -> Money {
        self.subtotal() - self.discount_amount(mode)
    }

    /// Lowers the discount to the most the current unit and mode allow.
    ///
    /// Returns true if the figure changed.
    fn clamp_discount(&mut self, mode: DiscountMode) -> bool {
        let max = max_discount(mode, self.effective_rate());
        if self.discount > max {
            self.discount = max;
            return true;
        }
        false
    }
}

// =============================================================================
// Edits & Outcomes
// =============================================================================

/// A single-field edit to an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum LineEdit {
    /// New operator quantity (positive; the cart applies the sign).
    Quantity(i64),
    /// Switch unit. Quantity is preserved, see [`crate::unit`].
    Unit(UnitType),
    /// New discount figure, in hundredths.
    Discount(i64),
}

/// Result of a successful [`Cart::add_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLineOutcome {
    pub key: LineKey,
    /// True when the quantity was added to an existing line.
    pub merged: bool,
    /// True when a control-flagged product was added in Warning mode.
    pub control_warning: bool,
}

/// Cart totals summary for the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub kind: TransactionKind,
    pub gross_total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The active cart.
///
/// ## Invariants
/// - At most one line per (batch, unit)
/// - Every line's quantity carries the sign of `kind`
/// - In a sale, a line's units consumed never exceeded the cached batch
///   availability at the moment it was created or increased
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    kind: TransactionKind,
    config: SessionConfig,
}

impl Cart {
    /// Creates an empty sale cart.
    pub fn new(config: SessionConfig) -> Self {
        Cart {
            lines: Vec::new(),
            kind: TransactionKind::Sale,
            config,
        }
    }

    /// Updates the session preferences used for new lines and totals.
    ///
    /// A discount-mode switch reinterprets the figures already on the lines;
    /// a figure over the new mode's limit is lowered to it. Returns the keys
    /// of the lines whose discount was lowered.
    pub fn apply_config(&mut self, config: SessionConfig) -> Vec<LineKey> {
        self.config = config;
        let mode = self.config.discount_mode;
        self.lines
            .iter_mut()
            .filter_map(|l| l.clamp_discount(mode).then(|| l.key()))
            .collect()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.key() == *key)
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn is_return(&self) -> bool {
        self.kind == TransactionKind::Return
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Adds a product/batch to the cart or increases an existing line.
    ///
    /// ## Behavior
    /// - `unit: None` uses the session default unit (Base if no pack)
    /// - Same (batch, unit) already present: quantity is summed
    /// - Sale carts: rejects with `InsufficientStock` when the resulting
    ///   units consumed exceed the batch's cached availability
    /// - Return carts: no stock check, quantity is added negative
    /// - Lock mode: control-flagged products are refused
    pub fn add_line(
        &mut self,
        product: &Product,
        batch: &Batch,
        quantity: i64,
        unit: Option<UnitType>,
    ) -> CoreResult<AddLineOutcome> {
        validate_quantity(quantity)?;

        if batch.product_id != product.id {
            return Err(ValidationError::not_allowed(
                "batch",
                format!("batch {} does not belong to product {}", batch.id, product.id),
            )
            .into());
        }

        if product.controlled && self.config.control_mode == ControlDrugMode::Lock {
            return Err(CoreError::ControlledProductLocked {
                product: product.name.clone(),
            });
        }

        let unit = product
            .pack_factor
            .resolve_unit(unit, self.config.default_unit);
        product.pack_factor.check_unit(unit)?;

        let key = LineKey::new(batch.id.clone(), unit);
        let signed = self.kind.signed(quantity);
        let existing = self.position(&key);

        let new_quantity = match existing {
            Some(idx) => self.lines[idx].quantity + signed,
            None => {
                validate_cart_size(self.lines.len())?;
                signed
            }
        };
        validate_line_quantity(new_quantity)?;

        if !self.is_return() {
            let units = product.pack_factor.units_consumed(new_quantity, unit);
            check_stock(&batch.id, batch.quantity_available, units)?;
        }

        let merged = match existing {
            Some(idx) => {
                self.lines[idx].quantity = new_quantity;
                true
            }
            None => {
                self.lines
                    .push(CartLine::new(product, batch, unit, new_quantity));
                false
            }
        };

        Ok(AddLineOutcome {
            key,
            merged,
            control_warning: product.controlled,
        })
    }

    /// Applies a single-field edit to a line.
    ///
    /// Returns the line's key after the edit (a unit switch changes it).
    /// Decreases are never stock-checked; increases in a sale are checked
    /// against `stock`, where an unknown batch counts as zero available.
    pub fn update_line(
        &mut self,
        key: &LineKey,
        edit: LineEdit,
        stock: &StockSnapshot,
    ) -> CoreResult<LineKey> {
        let idx = self
            .position(key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;

        match edit {
            LineEdit::Quantity(qty) => {
                validate_quantity(qty)?;
                let line = &self.lines[idx];
                let new_quantity = self.kind.signed(qty);
                let new_units = line.factor.units_consumed(new_quantity, line.unit);
                if !self.is_return() && new_units > line.units_consumed() {
                    check_stock(&line.batch_id, available(stock, &line.batch_id), new_units)?;
                }
                self.lines[idx].quantity = new_quantity;
                Ok(key.clone())
            }
            LineEdit::Unit(unit) => self.switch_unit(idx, unit, stock),
            LineEdit::Discount(discount) => {
                let line = &self.lines[idx];
                validate_discount(self.config.discount_mode, discount, line.effective_rate())?;
                self.lines[idx].discount = discount;
                Ok(key.clone())
            }
        }
    }

    /// Switches a line's unit, keeping its quantity.
    ///
    /// If a line already exists for the target (batch, unit), the two merge
    /// and the target's discount applies. Otherwise a Value-mode discount
    /// over the new unit's rate is lowered to that rate.
    fn switch_unit(
        &mut self,
        idx: usize,
        unit: UnitType,
        stock: &StockSnapshot,
    ) -> CoreResult<LineKey> {
        let line = &self.lines[idx];
        if line.unit == unit {
            return Ok(line.key());
        }
        line.factor.check_unit(unit)?;

        let target_key = LineKey::new(line.batch_id.clone(), unit);
        let target = self.position(&target_key);

        let new_quantity = match target {
            Some(t) => self.lines[t].quantity + line.quantity,
            None => line.quantity,
        };
        validate_line_quantity(new_quantity)?;

        let new_units = line.factor.units_consumed(new_quantity, unit);
        let old_units = line.units_consumed()
            + target.map_or(0, |t| self.lines[t].units_consumed());
        if !self.is_return() && new_units > old_units {
            check_stock(&line.batch_id, available(stock, &line.batch_id), new_units)?;
        }

        match target {
            Some(t) => {
                self.lines[t].quantity = new_quantity;
                self.lines.remove(idx);
            }
            None => {
                let mode = self.config.discount_mode;
                let line = &mut self.lines[idx];
                line.unit = unit;
                line.clamp_discount(mode);
            }
        }

        Ok(target_key)
    }

    /// Removes a line. No stock re-validation.
    pub fn remove_line(&mut self, key: &LineKey) -> CoreResult<CartLine> {
        let idx = self
            .position(key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;
        let removed = self.lines.remove(idx);
        if self.lines.is_empty() {
            self.kind = TransactionKind::Sale;
        }
        Ok(removed)
    }

    /// Removes every line and returns the cart to a sale.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.kind = TransactionKind::Sale;
    }

    /// Replaces the cart's content, e.g. when loading a hold or a return.
    ///
    /// Callers guarantee the lines' signs match `kind`.
    pub fn replace(&mut self, kind: TransactionKind, lines: Vec<CartLine>) {
        self.kind = kind;
        self.lines = lines;
    }

    /// Total for one line under the active discount mode.
    pub fn line_total(&self, line: &CartLine) -> Money {
        line.total(self.config.discount_mode)
    }

    /// Sum of line totals.
    pub fn gross_total(&self) -> Money {
        self.lines.iter().map(|l| self.line_total(l)).sum()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            line_count: self.lines.len(),
            kind: self.kind,
            gross_total: self.gross_total(),
        }
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.batch_id == key.batch_id && l.unit == key.unit)
    }
}

fn available(stock: &StockSnapshot, batch_id: &str) -> i64 {
    stock.available(batch_id).unwrap_or(0)
}

fn check_stock(batch_id: &str, available: i64, requested: i64) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientStock {
            batch: batch_id.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
