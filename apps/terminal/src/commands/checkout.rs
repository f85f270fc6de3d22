//! # Checkout Commands
//!
//! Hold, commit and return loading.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit(PaymentInfo)                                                    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  net = gross + adjustment ──► settle() ──► Sale | Return, change        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  TransactionDraft (base units)                                          │
//! │      │                                                                  │
//! │      ├── bound to hold h?  ──► update_transaction(h, draft)             │
//! │      └── otherwise         ──► create_transaction(draft)                │
//! │      │                                                                  │
//! │      ▼  (only on success)                                               │
//! │  Committed(kind) ──► Empty, cart cleared, deck unbound ──► refresh()   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed service call returns before the session is touched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use medix_core::payment;
use medix_core::snapshot::lines_for_return;
use medix_core::{
    Adjustment, CoreError, LifecycleAction, PaymentInfo, Settlement, TransactionDraft,
    TransactionKind, TransactionSnapshot, TransactionState, TransactionStatus, ValidationError,
};

use crate::commands::cart::CartResponse;
use crate::error::ApiResult;
use crate::terminal::Terminal;

/// Result of a successful [`Terminal::hold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldReceipt {
    pub id: String,
    /// True when an existing hold was updated in place.
    pub updated: bool,
    pub cart: CartResponse,
}

/// Result of a successful [`Terminal::commit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub id: String,
    pub settlement: Settlement,
}

/// What a hold or commit captured from the session before going remote.
struct Pending {
    draft: TransactionDraft,
    bound_id: Option<String>,
}

impl Terminal {
    /// Reconciles a payment against the current net total without committing.
    pub fn preview_settlement(&self, payment: PaymentInfo) -> ApiResult<Settlement> {
        self.session.with_session(|s| -> ApiResult<Settlement> {
            let net = s.adjustment.net_total(s.cart.gross_total());
            Ok(payment::settle(net, &payment)?)
        })
    }

    /// Parks the active transaction.
    ///
    /// ## Behavior
    /// - Unbound cart: creates a hold, then the cart resets to an empty new
    ///   sale (state `Held`, index -1)
    /// - Cart loaded from hold `h`: updates `h` in place and keeps editing it
    /// - Empty cart: `EmptyCart`, nothing sent
    pub async fn hold(&self) -> ApiResult<HoldReceipt> {
        let _op = self.op_lock.lock().await;

        let pending = self.session.with_session(|s| -> ApiResult<Pending> {
            let bound_id = s.deck.bound_id().map(str::to_string);
            let action = match bound_id {
                Some(_) => LifecycleAction::Rehold,
                None => LifecycleAction::Hold,
            };
            s.state.transition(action)?;
            Ok(Pending {
                draft: TransactionDraft::hold(&s.cart, &s.adjustment, s.return_of.clone())?,
                bound_id,
            })
        })?;

        let (id, updated) = match &pending.bound_id {
            Some(id) => (
                self.service.update_transaction(id, &pending.draft).await?,
                true,
            ),
            None => (self.service.create_transaction(&pending.draft).await?, false),
        };
        info!(hold_id = %id, updated, items = pending.draft.items.len(), "Transaction held");

        self.session.with_session_mut(|s| {
            if !updated {
                s.reset_cart();
                s.deck.unbind();
                s.state = TransactionState::Held;
            }
        });

        if let Err(e) = self.refresh_locked().await {
            warn!(error = %e, "Refresh after hold failed");
        }

        Ok(HoldReceipt {
            id,
            updated,
            cart: self.get_cart(),
        })
    }

    /// Finalizes the active transaction as a sale or return.
    ///
    /// The kind comes from the net total, so a sale whose adjustment pushes
    /// the net below zero is recorded as a return.
    pub async fn commit(&self, payment: PaymentInfo) -> ApiResult<CommitReceipt> {
        let _op = self.op_lock.lock().await;

        let (pending, settlement) =
            self.session
                .with_session(|s| -> ApiResult<(Pending, Settlement)> {
                    let net = s.adjustment.net_total(s.cart.gross_total());
                    s.state
                        .transition(LifecycleAction::Commit(payment::classify(net)))?;
                    let settlement = payment::settle(net, &payment)?;
                    let draft = TransactionDraft::commit(
                        &s.cart,
                        &s.adjustment,
                        &settlement,
                        s.return_of.clone(),
                    )?;
                    Ok((
                        Pending {
                            draft,
                            bound_id: s.deck.bound_id().map(str::to_string),
                        },
                        settlement,
                    ))
                })?;

        let id = match &pending.bound_id {
            Some(id) => self.service.update_transaction(id, &pending.draft).await?,
            None => self.service.create_transaction(&pending.draft).await?,
        };
        info!(
            transaction_id = %id,
            kind = ?settlement.kind,
            net_total = %settlement.net_total,
            change = %settlement.change,
            "Transaction committed"
        );

        self.session.with_session_mut(|s| {
            let committed = TransactionState::Committed(settlement.kind);
            s.state = committed
                .transition(LifecycleAction::Reset)
                .unwrap_or(TransactionState::Empty);
            s.reset_cart();
            s.deck.unbind();
        });

        if let Err(e) = self.refresh_locked().await {
            warn!(error = %e, "Refresh after commit failed");
        }

        Ok(CommitReceipt { id, settlement })
    }

    /// Builds a return cart from a committed sale.
    ///
    /// Lines mirror the sale's items with negated quantity, Base unit and no
    /// discount. The deck is unbound; the commit records `return_of`.
    pub fn load_for_return(&self, sale: &TransactionSnapshot) -> ApiResult<CartResponse> {
        debug!(sale_id = %sale.id, "load_for_return command");
        if sale.status != TransactionStatus::Paid {
            return Err(ValidationError::not_allowed(
                "transaction",
                format!("{} is {:?}, only paid sales can be returned", sale.id, sale.status),
            )
            .into());
        }
        let _edit = self.edit_guard()?;

        self.session.with_session_mut(|s| -> ApiResult<CartResponse> {
            let lines = lines_for_return(&sale.items, &s.stock);
            if lines.is_empty() {
                return Err(CoreError::EmptyCart.into());
            }
            let next = s.state.transition(LifecycleAction::LoadForReturn)?;

            s.cart.replace(TransactionKind::Return, lines);
            s.adjustment = Adjustment::none();
            s.return_of = Some(sale.id.clone());
            s.deck.unbind();
            s.state = next;

            info!(sale_id = %sale.id, lines = s.cart.line_count(), "Loaded sale for return");
            Ok(CartResponse::from(&*s))
        })
    }

    /// Fetches a committed sale by id and loads it for return.
    pub async fn load_for_return_by_id(&self, id: &str) -> ApiResult<CartResponse> {
        let sale = self.service.fetch_transaction(id).await?;
        self.load_for_return(&sale)
    }
}
