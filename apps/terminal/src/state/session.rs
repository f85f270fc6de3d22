//! # Session State
//!
//! Everything the terminal is working on right now: the active cart, its
//! adjustment, the held deck, the lifecycle state and the cached stock.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionState = Arc<Mutex<Session>>                                     │
//! │                                                                         │
//! │  sync edit (add_line, navigate, ...)                                    │
//! │      with_session_mut(|s| ...) ── whole edit under one lock             │
//! │                                                                         │
//! │  async op (hold, commit, refresh)                                       │
//! │      1. with_session(|s| build draft)        lock, copy, release        │
//! │      2. service.call(draft).await            no lock held               │
//! │      3. with_session_mut(|s| apply result)   only on success            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sync edits are refused while an async op holds the terminal's `op_lock`,
//! so step 3 never lands on a cart the operator changed in between.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use medix_core::{Adjustment, Cart, HeldDeck, SessionConfig, StockSnapshot, TransactionState};

/// The working set of one terminal.
#[derive(Debug)]
pub struct Session {
    pub cart: Cart,
    pub adjustment: Adjustment,
    pub deck: HeldDeck,
    pub state: TransactionState,
    pub stock: StockSnapshot,
    /// Committed sale the cart was loaded from for a return.
    pub return_of: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            cart: Cart::new(config),
            adjustment: Adjustment::none(),
            deck: HeldDeck::new(),
            state: TransactionState::Empty,
            stock: StockSnapshot::empty(Utc::now()),
            return_of: None,
        }
    }

    /// Empties the cart and drops the adjustment and return reference.
    ///
    /// The deck binding is left to the caller.
    pub fn reset_cart(&mut self) {
        self.cart.clear();
        self.adjustment = Adjustment::none();
        self.return_of = None;
    }
}

/// Shared handle to the [`Session`].
#[derive(Debug, Clone)]
pub struct SessionState {
    inner: Arc<Mutex<Session>>,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        SessionState {
            inner: Arc::new(Mutex::new(Session::new(config))),
        }
    }

    /// Executes a function with read access to the session.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = self.lock();
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// session.with_session_mut(|s| s.cart.remove_line(&key))?;
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut session = self.lock();
        f(&mut session)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
