//! The invoicing service seam.

use async_trait::async_trait;

use medix_core::{Product, TransactionDraft, TransactionSnapshot};

use crate::error::ClientResult;

/// Reads and writes against the external inventory-and-invoicing service.
///
/// ## Read Leniency
/// A read whose body cannot be decoded is logged and returned as an empty
/// collection. Transport failures and non-success statuses are errors.
#[async_trait]
pub trait InvoicingService: Send + Sync {
    /// All products with their batches.
    async fn fetch_inventory(&self) -> ClientResult<Vec<Product>>;

    /// Transactions in Hold status, newest first.
    async fn fetch_held(&self) -> ClientResult<Vec<TransactionSnapshot>>;

    /// One transaction by id, e.g. a committed sale to return against.
    async fn fetch_transaction(&self, id: &str) -> ClientResult<TransactionSnapshot>;

    /// Creates a transaction, returning its id.
    async fn create_transaction(&self, draft: &TransactionDraft) -> ClientResult<String>;

    /// Overwrites an existing transaction (re-hold, or hold → paid/return).
    async fn update_transaction(&self, id: &str, draft: &TransactionDraft) -> ClientResult<String>;
}
