//! # Cart Commands
//!
//! Synchronous edits of the active transaction.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐  add_line   ┌──────────┐   hold()    ┌──────────┐         │
//! │  │  Empty   │────────────►│ Building │────────────►│   Held   │         │
//! │  └──────────┘             └──────────┘             └──────────┘         │
//! │       ▲                    │   │   ▲                    │               │
//! │       │   clear / remove   │   │   │ update_line        │ add_line      │
//! │       └────── last line ───┘   │   │ remove_line        │ (new sale)    │
//! │                                │   └────────────────────┘               │
//! │                                ▼                                        │
//! │                          commit() (checkout.rs)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command validates fully before mutating, so a rejected edit leaves
//! the session exactly as it was.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use medix_core::{
    payment, Adjustment, CartLine, CoreError, DeckPosition, LifecycleAction, LineEdit, LineKey, Money,
    Percent, TransactionKind, TransactionState, UnitType, ValidationError,
};

use crate::error::ApiResult;
use crate::state::Session;
use crate::terminal::Terminal;

// =============================================================================
// Responses
// =============================================================================

/// One cart line as the operator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub key: LineKey,
    pub product_name: String,
    pub unit: UnitType,
    pub quantity: i64,
    /// Price per operator unit.
    pub rate: Money,
    pub discount: i64,
    pub total: Money,
    pub controlled: bool,
}

/// Totals including the adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    pub line_count: usize,
    pub gross_total: Money,
    pub adjustment: Money,
    pub adjustment_percent: Option<Percent>,
    pub net_total: Money,
    /// What a commit would record right now.
    pub classification: TransactionKind,
}

/// Cart response including lines, totals and where the session stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<LineView>,
    pub totals: TotalsView,
    pub state: TransactionState,
    pub deck: DeckPosition,
    pub return_of: Option<String>,
}

impl From<&Session> for CartResponse {
    fn from(s: &Session) -> Self {
        let mode = s.cart.config().discount_mode;
        let lines = s
            .cart
            .lines()
            .iter()
            .map(|l: &CartLine| LineView {
                key: l.key(),
                product_name: l.product_name.clone(),
                unit: l.unit,
                quantity: l.quantity,
                rate: l.effective_rate(),
                discount: l.discount,
                total: l.total(mode),
                controlled: l.controlled,
            })
            .collect();

        let gross_total = s.cart.gross_total();
        let net_total = s.adjustment.net_total(gross_total);

        CartResponse {
            lines,
            totals: TotalsView {
                line_count: s.cart.line_count(),
                gross_total,
                adjustment: s.adjustment.amount(),
                adjustment_percent: s.adjustment.percent(),
                net_total,
                classification: payment::classify(net_total),
            },
            state: s.state,
            deck: s.deck.position(),
            return_of: s.return_of.clone(),
        }
    }
}

/// Result of [`Terminal::add_line`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineResponse {
    pub key: LineKey,
    pub merged: bool,
    /// A controlled product was added in Warning mode and needs verification.
    pub control_warning: bool,
    pub cart: CartResponse,
}

/// Largest adjustment percentage either way.
const MAX_ADJUSTMENT_BPS: i64 = 10_000;

// =============================================================================
// Commands
// =============================================================================

impl Terminal {
    /// Gets the current cart contents.
    pub fn get_cart(&self) -> CartResponse {
        self.session.with_session(|s| CartResponse::from(s))
    }

    /// Adds a batch to the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator picks batch LOT-7, types 3, chooses Pack
    ///      │
    ///      ▼
    /// look up batch in cached stock ── unknown? → "batch is required"
    ///      │
    ///      ▼
    /// Cart::add_line ── merge by (batch, unit), stock check on sales
    ///      │
    ///      ▼
    /// Empty/Held → Building
    /// ```
    pub fn add_line(
        &self,
        batch_id: &str,
        quantity: i64,
        unit: Option<UnitType>,
    ) -> ApiResult<AddLineResponse> {
        debug!(batch_id, quantity, ?unit, "add_line command");
        let _edit = self.edit_guard()?;
        let window = self.config.get().service.staleness_window();

        self.session.with_session_mut(|s| -> ApiResult<AddLineResponse> {
            if s.stock.is_stale(Utc::now(), window) {
                warn!(
                    age_secs = s.stock.age(Utc::now()).num_seconds(),
                    "Adding against a stale stock snapshot"
                );
            }

            let (product, batch) = s
                .stock
                .find_batch(batch_id)
                .ok_or_else(|| ValidationError::required("batch"))?;
            let next = s.state.transition(LifecycleAction::AddLine)?;

            let outcome = s.cart.add_line(product, batch, quantity, unit)?;
            if outcome.control_warning {
                warn!(product = %product.name, "Controlled product added, verification required");
            }

            s.state = next;
            Ok(AddLineResponse {
                key: outcome.key,
                merged: outcome.merged,
                control_warning: outcome.control_warning,
                cart: CartResponse::from(&*s),
            })
        })
    }

    /// Changes one field of a line.
    pub fn update_line(&self, key: &LineKey, edit: LineEdit) -> ApiResult<CartResponse> {
        debug!(%key, ?edit, "update_line command");
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            s.state.transition(LifecycleAction::EditLine)?;
            s.cart.update_line(key, edit, &s.stock)?;
            Ok(CartResponse::from(&*s))
        })
    }

    /// Removes a line. Removing the last line empties the transaction and
    /// drops its adjustment; a hold binding is kept.
    pub fn remove_line(&self, key: &LineKey) -> ApiResult<CartResponse> {
        debug!(%key, "remove_line command");
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            if s.cart.line(key).is_none() {
                return Err(CoreError::LineNotFound(key.to_string()).into());
            }
            let action = if s.cart.line_count() == 1 {
                LifecycleAction::RemoveLastLine
            } else {
                LifecycleAction::EditLine
            };
            let next = s.state.transition(action)?;

            s.cart.remove_line(key)?;
            if s.cart.is_empty() {
                s.adjustment = Adjustment::none();
                s.return_of = None;
            }
            s.state = next;
            Ok(CartResponse::from(&*s))
        })
    }

    /// Empties the cart and returns to a new sale.
    pub fn clear(&self) -> ApiResult<CartResponse> {
        debug!("clear command");
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            let next = s.state.transition(LifecycleAction::Clear)?;
            s.reset_cart();
            s.deck.unbind();
            s.state = next;
            Ok(CartResponse::from(&*s))
        })
    }

    /// Sets the adjustment to `percent` of the current gross total.
    ///
    /// The amount is fixed at entry; later line edits do not rescale it.
    pub fn set_adjustment_percent(&self, percent: Percent) -> ApiResult<CartResponse> {
        debug!(%percent, "set_adjustment_percent command");
        if percent.bps().abs() > MAX_ADJUSTMENT_BPS {
            return Err(ValidationError::OutOfRange {
                field: "adjustment".to_string(),
                min: -MAX_ADJUSTMENT_BPS,
                max: MAX_ADJUSTMENT_BPS,
            }
            .into());
        }
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            s.state.transition(LifecycleAction::EditLine)?;
            s.adjustment = Adjustment::from_percent(s.cart.gross_total(), percent);
            Ok(CartResponse::from(&*s))
        })
    }

    /// Overwrites the adjustment with a signed amount.
    pub fn set_adjustment_amount(&self, amount: Money) -> ApiResult<CartResponse> {
        debug!(%amount, "set_adjustment_amount command");
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            s.state.transition(LifecycleAction::EditLine)?;
            s.adjustment = Adjustment::from_amount(amount);
            Ok(CartResponse::from(&*s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{pack_product, terminal_with};
    use crate::error::ErrorCode;
    use medix_core::DiscountMode;

    #[tokio::test]
    async fn test_pack_overflow_is_insufficient_stock() {
        // factor 5, rate 10.00, 10 units on hand: 3 packs = 15 units
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 5, 1_000, 10)]).await;

        let err = terminal.add_line("b1", 3, Some(UnitType::Pack)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(terminal.cart().is_empty());
        assert_eq!(terminal.state(), TransactionState::Empty);

        terminal.add_line("b1", 2, Some(UnitType::Pack)).unwrap();
        assert_eq!(terminal.state(), TransactionState::Building);
        assert_eq!(terminal.totals().gross_total, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_line_discount_and_adjustment() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 5_000, 50)]).await;

        let added = terminal.add_line("b1", 2, None).unwrap();
        terminal
            .update_line(&added.key, LineEdit::Discount(1_000))
            .unwrap();
        let cart = terminal
            .set_adjustment_amount(Money::from_cents(-2_000))
            .unwrap();

        assert_eq!(cart.lines[0].total, Money::from_cents(9_000));
        assert_eq!(cart.totals.gross_total, Money::from_cents(9_000));
        assert_eq!(cart.totals.net_total, Money::from_cents(7_000));
        assert_eq!(cart.totals.classification, TransactionKind::Sale);
    }

    #[tokio::test]
    async fn test_percent_adjustment_is_a_snapshot() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 1_000, 50)]).await;

        let added = terminal.add_line("b1", 10, None).unwrap();
        let cart = terminal
            .set_adjustment_percent(Percent::from_whole(-10))
            .unwrap();
        assert_eq!(cart.totals.adjustment, Money::from_cents(-1_000));

        let cart = terminal
            .update_line(&added.key, LineEdit::Quantity(20))
            .unwrap();
        assert_eq!(cart.totals.adjustment, Money::from_cents(-1_000));
        assert_eq!(cart.totals.net_total, Money::from_cents(19_000));
    }

    #[tokio::test]
    async fn test_unknown_batch_is_validation_error() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 5)]).await;
        let err = terminal.add_line("nope", 1, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(terminal.get_cart().deck.index, -1);
    }

    #[tokio::test]
    async fn test_remove_last_line_returns_to_empty() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 5)]).await;
        let added = terminal.add_line("b1", 1, None).unwrap();
        terminal
            .set_adjustment_amount(Money::from_cents(-10))
            .unwrap();

        let cart = terminal.remove_line(&added.key).unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.state, TransactionState::Empty);
        assert_eq!(cart.totals.adjustment, Money::zero());

        let err = terminal.remove_line(&added.key).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_edits_refused_when_empty() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 5)]).await;
        let err = terminal
            .set_adjustment_amount(Money::from_cents(-10))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err = terminal
            .set_adjustment_percent(Percent::from_whole(150))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unit_toggle_keeps_quantity() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 10, 200, 100)]).await;
        let added = terminal.add_line("b1", 3, Some(UnitType::Base)).unwrap();

        let cart = terminal
            .update_line(&added.key, LineEdit::Unit(UnitType::Pack))
            .unwrap();
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.lines[0].unit, UnitType::Pack);
        assert_eq!(cart.lines[0].rate, Money::from_cents(2_000));

        // 11 packs would need 110 units
        let err = terminal
            .update_line(&LineKey::new("b1", UnitType::Pack), LineEdit::Quantity(11))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(terminal.cart().lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 5)]).await;
        terminal.add_line("b1", 2, None).unwrap();
        terminal
            .set_adjustment_amount(Money::from_cents(50))
            .unwrap();

        let cart = terminal.clear().unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.totals.net_total, Money::zero());
        assert_eq!(cart.state, TransactionState::Empty);
        assert_eq!(terminal.cart().config().discount_mode, DiscountMode::Percent);
    }

    #[tokio::test]
    async fn test_toggle_to_base_keeps_sale_positive() {
        // factor 10, 1.00 per tablet
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 10, 100, 100)]).await;
        terminal.set_discount_mode(DiscountMode::Value).unwrap();
        let key = terminal.add_line("b1", 2, Some(UnitType::Pack)).unwrap().key;
        terminal.update_line(&key, LineEdit::Discount(900)).unwrap();

        let cart = terminal
            .update_line(&key, LineEdit::Unit(UnitType::Base))
            .unwrap();
        assert_eq!(cart.lines[0].discount, 100);
        assert_eq!(cart.totals.gross_total, Money::zero());
        assert_eq!(cart.totals.classification, TransactionKind::Sale);
    }

    #[tokio::test]
    async fn test_edits_refused_while_saving() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 5)]).await;
        let key = terminal.add_line("b1", 1, None).unwrap().key;

        let busy = terminal.op_lock.lock().await;
        let err = terminal.add_line("b1", 1, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(terminal.remove_line(&key).is_err());
        assert!(terminal.clear().is_err());
        assert_eq!(terminal.cart().lines()[0].quantity, 1);
        drop(busy);

        let added = terminal.add_line("b1", 1, None).unwrap();
        assert_eq!(added.cart.lines[0].quantity, 2);
    }
}
