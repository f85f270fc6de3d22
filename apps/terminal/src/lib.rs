//! # Medix Terminal Library
//!
//! The point-of-sale terminal built on `medix-core` and `medix-client`.
//!
//! ## Module Organization
//! ```text
//! medix_terminal/
//! ├── lib.rs          ◄─── You are here (exports & tracing setup)
//! ├── terminal.rs     ◄─── Terminal: session + config + service
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Cart, deck, lifecycle, stock cache
//! │   └── config.rs   ◄─── TerminalConfig and its TOML store
//! ├── commands/
//! │   ├── cart.rs     ◄─── Line and adjustment edits
//! │   ├── deck.rs     ◄─── Navigation and refresh
//! │   ├── checkout.rs ◄─── Hold, commit, returns
//! │   └── config.rs   ◄─── Preference changes
//! └── error.rs        ◄─── ApiError for the operator
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use medix_client::HttpInvoicingService;
//! use medix_terminal::{state::ConfigStore, Terminal};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::open(None);
//! let settings = store.get().service;
//! let timeout = settings.timeout();
//! let service = HttpInvoicingService::new(settings.base_url, timeout)?;
//! let terminal = Terminal::start(Arc::new(service), store).await;
//! terminal.add_line("batch-1", 2, None)?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod error;
pub mod state;
pub mod terminal;

use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use terminal::Terminal;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - Default: `info`, `debug` for the medix crates, `warn` for reqwest
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medix=debug,reqwest=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
