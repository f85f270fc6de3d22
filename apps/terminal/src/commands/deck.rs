//! # Deck Commands
//!
//! Navigation through held transactions and the service refresh.
//!
//! ```text
//!   index:   -1        0          1          2
//!          [new]   [newest]   [older]   [oldest]
//!            ◄── forward        back ──►
//! ```
//!
//! Moving onto a hold reconstructs its lines into the active cart and binds
//! the hold's id; moving to -1 starts an empty new sale.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use medix_core::deck::NEW_SALE;
use medix_core::snapshot::reconstruct_from_snapshot;
use medix_core::{
    Adjustment, DeckPosition, Direction, LifecycleAction, Money, Reanchor, StockSnapshot,
    TransactionStatus,
};

use crate::commands::cart::CartResponse;
use crate::error::ApiResult;
use crate::terminal::Terminal;

/// Summary of one held transaction for the deck strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldSummary {
    pub id: String,
    pub created_at: chrono::DateTime<Utc>,
    pub item_count: usize,
    pub total: Money,
}

/// The deck as the operator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckResponse {
    pub position: DeckPosition,
    pub holds: Vec<HoldSummary>,
}

impl Terminal {
    /// Gets the cached deck.
    pub fn deck(&self) -> DeckResponse {
        self.session.with_session(|s| DeckResponse {
            position: s.deck.position(),
            holds: s
                .deck
                .holds()
                .iter()
                .map(|h| HoldSummary {
                    id: h.id.clone(),
                    created_at: h.created_at,
                    item_count: h.items.len(),
                    total: h.items_total() + h.adjustment,
                })
                .collect(),
        })
    }

    /// Moves one step through the deck and loads what is there.
    ///
    /// At either end the call is a no-op and returns the current cart.
    pub fn navigate(&self, direction: Direction) -> ApiResult<CartResponse> {
        let target = self.session.with_session(|s| s.deck.target(direction));
        match target {
            Some(index) => self.load(index),
            None => {
                debug!(?direction, "Deck navigation at bound, ignoring");
                Ok(self.get_cart())
            }
        }
    }

    /// Loads deck position `index` into the active cart.
    ///
    /// ## Behavior
    /// - `-1`: empty cart, no adjustment, no bound hold
    /// - `i ≥ 0`: lines reconstructed from the hold's persisted items, its
    ///   adjustment and sale reference restored, its id bound so the next
    ///   `hold()` updates it
    pub fn load(&self, index: isize) -> ApiResult<CartResponse> {
        debug!(index, "load command");
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            if index == NEW_SALE {
                let next = s.state.transition(LifecycleAction::LoadNew)?;
                s.reset_cart();
                s.deck.unbind();
                s.state = next;
                return Ok(CartResponse::from(&*s));
            }

            s.deck.check_index(index)?;
            let next = s.state.transition(LifecycleAction::LoadHold)?;

            let Some(hold) = s.deck.get(index) else {
                return Err(medix_core::CoreError::HoldNotFound {
                    index,
                    count: s.deck.len(),
                }
                .into());
            };
            let mode = s.cart.config().discount_mode;
            let (kind, lines) = reconstruct_from_snapshot(&hold.items, mode, &s.stock);
            let adjustment = Adjustment::from_amount(hold.adjustment);
            let return_of = hold.return_of.clone();

            s.cart.replace(kind, lines);
            s.adjustment = adjustment;
            s.return_of = return_of;
            s.deck.select(index)?;
            s.state = next;

            info!(index, hold_id = ?s.deck.bound_id(), "Loaded held transaction");
            Ok(CartResponse::from(&*s))
        })
    }

    /// Re-reads inventory and held transactions from the service.
    pub async fn refresh(&self) -> ApiResult<DeckResponse> {
        let _op = self.op_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh body; the caller holds `op_lock`.
    ///
    /// Both reads must succeed before anything is replaced. The deck then
    /// re-anchors by held id: a bound hold that disappeared is dropped and
    /// the cart's lines stay as an unbound new sale.
    pub(crate) async fn refresh_locked(&self) -> ApiResult<DeckResponse> {
        let products = self.service.fetch_inventory().await?;
        let held = self.service.fetch_held().await?;

        let held: Vec<_> = held
            .into_iter()
            .filter(|h| h.status == TransactionStatus::Hold)
            .collect();

        self.session.with_session_mut(|s| {
            s.stock = StockSnapshot::new(products, Utc::now());
            match s.deck.replace(held) {
                Reanchor::Unbound => {}
                Reanchor::Moved { from, to } if from != to => {
                    debug!(from, to, "Bound hold moved in deck");
                }
                Reanchor::Moved { .. } => {}
                Reanchor::Dropped { id } => {
                    warn!(hold_id = %id, "Bound hold is no longer held, continuing as new sale");
                }
            }
            debug!(
                batches = s.stock.batch_count(),
                holds = s.deck.len(),
                "Refreshed stock and deck"
            );
        });

        Ok(self.deck())
    }
}
