//! # Terminal Commands
//!
//! Operations the operator invokes, grouped the way the till screen groups
//! them.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart (cart.rs)          add_line, update_line, remove_line, clear,     │
//! │                          set_adjustment_percent, set_adjustment_amount  │
//! │                                                                         │
//! │  Deck (deck.rs)          deck, navigate, load, refresh                  │
//! │                                                                         │
//! │  Checkout (checkout.rs)  hold, commit, preview_settlement,              │
//! │                          load_for_return, load_for_return_by_id         │
//! │                                                                         │
//! │  Config (config.rs)      config, set_default_unit, set_discount_mode,   │
//! │                          set_control_mode                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod deck;

pub use cart::{AddLineResponse, CartResponse, LineView, TotalsView};
pub use checkout::{CommitReceipt, HoldReceipt};
pub use deck::{DeckResponse, HoldSummary};

#[cfg(test)]
pub(crate) mod test_support {
    use std::ops::Deref;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use medix_client::MemoryInvoicingService;
    use medix_core::{
        Batch, ConversionFactor, Money, Product, SnapshotItem, TransactionSnapshot,
        TransactionStatus,
    };

    use crate::state::{ConfigStore, TerminalConfig};
    use crate::terminal::Terminal;

    /// A terminal whose config lives in a temp dir for the test's duration.
    pub struct TestTerminal {
        terminal: Terminal,
        _dir: TempDir,
    }

    impl Deref for TestTerminal {
        type Target = Terminal;

        fn deref(&self) -> &Terminal {
            &self.terminal
        }
    }

    pub async fn terminal_with(
        products: Vec<Product>,
    ) -> (TestTerminal, Arc<MemoryInvoicingService>) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("terminal.toml"), TerminalConfig::default());
        let service = Arc::new(MemoryInvoicingService::new(products));
        let terminal = Terminal::start(service.clone(), store).await;
        (
            TestTerminal {
                terminal,
                _dir: dir,
            },
            service,
        )
    }

    pub fn pack_product(
        id: &str,
        batch_id: &str,
        factor: u32,
        rate_cents: i64,
        available: i64,
    ) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            base_unit: "tablet".to_string(),
            pack_unit: (factor > 1).then(|| "strip".to_string()),
            pack_factor: ConversionFactor::new(factor).unwrap(),
            controlled: false,
            batches: vec![Batch {
                id: batch_id.to_string(),
                product_id: id.to_string(),
                batch_number: format!("LOT-{}", batch_id),
                quantity_available: available,
                selling_price: Money::from_cents(rate_cents),
                expiry: None,
            }],
        }
    }

    pub fn held(
        id: &str,
        minutes_ago: i64,
        batch_id: &str,
        quantity: i64,
        unit_cents: i64,
        total_cents: i64,
    ) -> TransactionSnapshot {
        TransactionSnapshot {
            id: id.to_string(),
            status: TransactionStatus::Hold,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            adjustment: Money::zero(),
            items: vec![SnapshotItem {
                product_id: "p1".to_string(),
                batch_id: batch_id.to_string(),
                quantity,
                unit_price: Money::from_cents(unit_cents),
                total_price: Money::from_cents(total_cents),
            }],
            return_of: None,
        }
    }
}
