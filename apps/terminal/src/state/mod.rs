//! # State Module
//!
//! Manages terminal state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Terminal                                       │
//! │                              │                                          │
//! │          ┌───────────────────┼───────────────────┐                      │
//! │          ▼                   ▼                   ▼                      │
//! │  ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐           │
//! │  │ SessionState │   │  ConfigStore   │   │ InvoicingService │           │
//! │  │              │   │                │   │                  │           │
//! │  │ cart, deck,  │   │ terminal.toml  │   │ inventory, holds │           │
//! │  │ adjustment,  │   │ written on     │   │ transaction      │           │
//! │  │ lifecycle,   │   │ every change   │   │ writes           │           │
//! │  │ stock cache  │   │                │   │                  │           │
//! │  └──────────────┘   └────────────────┘   └──────────────────┘           │
//! │                                                                         │
//! │  SessionState: Arc<Mutex<Session>>, never held across an await          │
//! │  ConfigStore:  Mutex<TerminalConfig>, single writer                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::{
    parse_control_mode, parse_discount_mode, parse_unit, ConfigError, ConfigResult, ConfigStore,
    ServiceSettings, TerminalConfig,
};
pub use session::{Session, SessionState};
