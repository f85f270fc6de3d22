//! # medix-core: Point-of-Sale Transaction Engine
//!
//! The pure engine behind the Medix POS terminal: cart lines and their unit
//! and discount math, the global adjustment, payment reconciliation, the
//! held-transaction deck and the lifecycle that ties them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medix POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Terminal (apps/terminal)                     │   │
//! │  │    add_line, navigate, hold, commit, load_for_return, config    │   │
//! │  └───────────────┬─────────────────────────────────┬───────────────┘   │
//! │                  │                                 │                    │
//! │  ┌───────────────▼─────────────────┐  ┌────────────▼────────────────┐  │
//! │  │   ★ medix-core (THIS CRATE) ★   │  │   medix-client              │  │
//! │  │                                 │  │   InvoicingService (HTTP)   │  │
//! │  │  unit ─► cart ─► adjustment     │  │   inventory, holds, writes  │  │
//! │  │           │          │          │  └─────────────────────────────┘  │
//! │  │           ▼          ▼          │                                   │
//! │  │   deck ◄─ snapshot   payment    │                                   │
//! │  │           lifecycle   draft     │                                   │
//! │  │                                 │                                   │
//! │  │  NO I/O • NO NETWORK • NO CLOCK │                                   │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer cents and basis-point percentages
//! - [`types`] - Products, batches, session preferences, snapshots
//! - [`unit`] - Base/pack conversion
//! - [`cart`] - Cart lines, merging, stock checks, totals
//! - [`adjustment`] - Transaction-level discount or surcharge
//! - [`payment`] - Sale/return classification and change
//! - [`deck`] - Held transactions and navigation
//! - [`snapshot`] - Lossy reconstruction of lines from persisted items
//! - [`draft`] - Write payload in base units
//! - [`lifecycle`] - Transaction state machine
//! - [`stock`] - Cached inventory snapshot
//! - [`validation`] / [`error`] - Input rules and typed errors
//!
//! ## Example Usage
//!
//! ```rust
//! use medix_core::adjustment::Adjustment;
//! use medix_core::money::Money;
//!
//! // 2 × 50.00 at 10% off, then 20.00 off the whole bill
//! let gross = Money::from_cents(9_000);
//! let adjustment = Adjustment::from_amount(Money::from_cents(-2_000));
//! assert_eq!(adjustment.net_total(gross).cents(), 7_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adjustment;
pub mod cart;
pub mod deck;
pub mod draft;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod payment;
pub mod snapshot;
pub mod stock;
pub mod types;
pub mod unit;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use adjustment::Adjustment;
pub use cart::{AddLineOutcome, Cart, CartLine, CartTotals, LineEdit, LineKey};
pub use deck::{DeckPosition, Direction, HeldDeck, Reanchor};
pub use draft::{DraftItem, TransactionDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{LifecycleAction, TransactionState};
pub use money::{Money, Percent};
pub use payment::{PaymentInfo, Settlement};
pub use stock::StockSnapshot;
pub use types::*;
pub use unit::ConversionFactor;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum operator-unit quantity on one line.
///
/// ## Business Reason
/// Catches a mistyped quantity (9999 instead of 99) before it reaches the
/// stock check.
pub const MAX_LINE_QUANTITY: i64 = 9_999;
