//! # Terminal
//!
//! One point-of-sale terminal: the session, its local config and the
//! invoicing service it talks to. The operations live in [`crate::commands`].
//!
//! ## Operation Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  hold()    ─┐                                                           │
//! │  commit()  ─┼──► op_lock (tokio Mutex) ──► one service round-trip at    │
//! │  refresh() ─┘                              a time per terminal          │
//! │                                                                         │
//! │  add_line / update_line / load / ...  ──► op_lock.try_lock()            │
//! │                                           busy? → INVALID_STATE, no edit │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A hold or commit resets the cart when its write succeeds, so edits are
//! refused for as long as a round-trip is in flight.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{info, warn};

use medix_client::InvoicingService;
use medix_core::{Cart, CartTotals, DeckPosition, TransactionState};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{ConfigStore, SessionState};

pub struct Terminal {
    pub(crate) service: Arc<dyn InvoicingService>,
    pub(crate) session: SessionState,
    pub(crate) config: ConfigStore,
    pub(crate) op_lock: AsyncMutex<()>,
}

impl Terminal {
    /// Creates a terminal with an empty stock snapshot and deck.
    pub fn new(service: Arc<dyn InvoicingService>, config: ConfigStore) -> Self {
        let session = SessionState::new(config.session());
        Terminal {
            service,
            session,
            config,
            op_lock: AsyncMutex::new(()),
        }
    }

    /// Creates a terminal and performs the initial inventory and deck read.
    ///
    /// A failed read is logged; the terminal starts with an empty snapshot
    /// and the operator can retry with `refresh()`.
    pub async fn start(service: Arc<dyn InvoicingService>, config: ConfigStore) -> Self {
        let terminal = Terminal::new(service, config);
        match terminal.refresh().await {
            Ok(deck) => info!(holds = deck.position.count, "Terminal started"),
            Err(e) => warn!(error = %e, "Initial refresh failed, starting with empty stock"),
        }
        terminal
    }

    pub fn state(&self) -> TransactionState {
        self.session.with_session(|s| s.state)
    }

    pub fn totals(&self) -> CartTotals {
        self.session.with_session(|s| s.cart.totals())
    }

    pub fn deck_position(&self) -> DeckPosition {
        self.session.with_session(|s| s.deck.position())
    }

    /// A copy of the active cart.
    pub fn cart(&self) -> Cart {
        self.session.with_session(|s| s.cart.clone())
    }

    /// Claims `op_lock` for a synchronous edit, failing if it is taken.
    pub(crate) fn edit_guard(&self) -> ApiResult<AsyncMutexGuard<'_, ()>> {
        self.op_lock.try_lock().map_err(|_| {
            ApiError::new(
                ErrorCode::InvalidState,
                "the transaction is being saved, try again when it completes",
            )
        })
    }

    /// True when the cached stock is older than the configured window.
    pub fn stock_is_stale(&self) -> bool {
        let window = self.config.get().service.staleness_window();
        self.session
            .with_session(|s| s.stock.is_stale(Utc::now(), window))
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
