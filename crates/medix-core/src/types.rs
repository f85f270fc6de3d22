//! # Domain Types
//!
//! Core domain types shared by the engine, the invoicing client, and the
//! terminal.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │     Batch       │   │ TransactionSnapshot │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id             │1─*│  id             │   │  id                 │   │
//! │  │  name           │   │  batch_number   │   │  status (Hold/...)  │   │
//! │  │  base_unit      │   │  qty_available  │   │  adjustment         │   │
//! │  │  pack_factor    │   │  selling_price  │   │  items (base units) │   │
//! │  │  controlled     │   │  expiry         │   └─────────────────────┘   │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   UnitType      │   │  DiscountMode   │   │  ControlDrugMode    │   │
//! │  │  Base | Pack    │   │ Percent | Value │   │  Warning | Lock     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products and batches are owned by the external inventory service. The
//! engine only ever reads them from a cached [`StockSnapshot`](crate::stock::StockSnapshot).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::unit::ConversionFactor;

// =============================================================================
// Product & Batch
// =============================================================================

/// A product as delivered by the inventory read, with its batches embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown to the operator.
    pub name: String,

    /// Name of the smallest sellable unit ("tablet", "ml").
    pub base_unit: String,

    /// Name of the pack unit, if the product has one ("strip", "box").
    pub pack_unit: Option<String>,

    /// Base units per pack. 1 means the product has no pack unit.
    pub pack_factor: ConversionFactor,

    /// Control-substance flag.
    pub controlled: bool,

    pub batches: Vec<Batch>,
}

impl Product {
    /// Returns the batch with the given id.
    pub fn batch(&self, batch_id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == batch_id)
    }

    /// Pack selection is only offered when the factor is above one.
    #[inline]
    pub fn offers_pack(&self) -> bool {
        self.pack_factor.offers_pack()
    }
}

/// A batch (lot) of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub product_id: String,

    /// Lot number printed on the packaging.
    pub batch_number: String,

    /// Stock on hand in base units, as of the snapshot.
    pub quantity_available: i64,

    /// Selling price per base unit.
    pub selling_price: Money,

    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,
}

// =============================================================================
// Session Preferences
// =============================================================================

/// The unit a line is sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[default]
    Base,
    Pack,
}

/// How a line's discount figure is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMode {
    /// Discount is a percentage of the line subtotal.
    #[default]
    Percent,
    /// Discount is an amount per operator unit.
    Value,
}

/// How control-flagged products are treated at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ControlDrugMode {
    /// Allow the sale, flag it for verification.
    #[default]
    Warning,
    /// Refuse to add the product.
    Lock,
}

/// Operator preferences for the session.
///
/// Passed explicitly into the cart engine; the terminal persists it locally
/// and pushes every change through [`Cart::apply_config`](crate::cart::Cart::apply_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionConfig {
    #[serde(default)]
    pub default_unit: UnitType,

    #[serde(default)]
    pub discount_mode: DiscountMode,

    #[serde(default)]
    pub control_mode: ControlDrugMode,
}

// =============================================================================
// Payment & Classification
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that produces change.
    Cash,
    /// Card payment on an external terminal.
    ExternalCard,
    /// Charged to the customer's account.
    Credit,
}

impl PaymentMethod {
    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

/// Whether a transaction charges or refunds the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[default]
    Sale,
    Return,
}

impl TransactionKind {
    /// Applies the kind's sign to an operator-entered (positive) quantity.
    #[inline]
    pub fn signed(&self, qty: i64) -> i64 {
        match self {
            TransactionKind::Sale => qty,
            TransactionKind::Return => -qty,
        }
    }
}

/// Status of a transaction record at the invoicing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Hold,
    Paid,
    Return,
}

impl From<TransactionKind> for TransactionStatus {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Sale => TransactionStatus::Paid,
            TransactionKind::Return => TransactionStatus::Return,
        }
    }
}

// =============================================================================
// Transaction Snapshots
// =============================================================================

/// A persisted line item, always expressed in base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotItem {
    pub product_id: String,
    pub batch_id: String,
    /// Quantity in base units (negative on returns).
    pub quantity: i64,
    /// Price per base unit.
    pub unit_price: Money,
    /// Line total after the line discount.
    pub total_price: Money,
}

impl SnapshotItem {
    /// `unit_price × quantity`, before any discount.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A transaction as stored by the invoicing service.
///
/// The deck materializes `Hold` records; `load_for_return` consumes
/// `Paid` ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionSnapshot {
    /// Opaque id assigned by the service.
    pub id: String,
    pub status: TransactionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Signed adjustment total that was applied.
    pub adjustment: Money,
    pub items: Vec<SnapshotItem>,
    /// Sale a return was loaded from, kept on held returns too.
    #[serde(default)]
    pub return_of: Option<String>,
}

impl TransactionSnapshot {
    /// Sum of the persisted line totals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|i| i.total_price).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
