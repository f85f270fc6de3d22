//! In-process invoicing service.
//!
//! Keeps inventory and transactions in memory and applies the same stock
//! effects as the real service: a committed sale deducts its base units, a
//! committed return puts them back, holds leave stock alone. Used by the
//! terminal's tests and by the binary's offline demo mode.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use medix_core::{
    Product, SnapshotItem, TransactionDraft, TransactionSnapshot, TransactionStatus,
};

use crate::error::{ClientError, ClientResult};
use crate::service::InvoicingService;

#[derive(Debug, Default)]
struct Store {
    products: Vec<Product>,
    transactions: Vec<TransactionSnapshot>,
    last_created: Option<DateTime<Utc>>,
    offline: bool,
    writes: usize,
}

impl Store {
    fn ensure_online(&self) -> ClientResult<()> {
        if self.offline {
            return Err(ClientError::Service {
                status: 503,
                message: "invoicing service unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Strictly increasing creation time so newest-first ordering is stable.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }

    fn apply_stock(&mut self, draft: &TransactionDraft) {
        if draft.status == TransactionStatus::Hold {
            return;
        }
        for item in &draft.items {
            let batch = self
                .products
                .iter_mut()
                .flat_map(|p| p.batches.iter_mut())
                .find(|b| b.id == item.batch_id);
            if let Some(batch) = batch {
                batch.quantity_available -= item.quantity;
            }
        }
    }
}

fn snapshot_items(draft: &TransactionDraft) -> Vec<SnapshotItem> {
    draft
        .items
        .iter()
        .map(|i| SnapshotItem {
            product_id: i.product_id.clone(),
            batch_id: i.batch_id.clone(),
            quantity: i.quantity,
            unit_price: i.unit_price,
            total_price: i.total_price,
        })
        .collect()
}

/// Memory-backed [`InvoicingService`].
#[derive(Debug, Default)]
pub struct MemoryInvoicingService {
    store: Mutex<Store>,
}

impl MemoryInvoicingService {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            store: Mutex::new(Store {
                products,
                ..Store::default()
            }),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every call fail as if the service were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.store().offline = offline;
    }

    /// Seeds a transaction as if another terminal had written it.
    pub fn insert(&self, snapshot: TransactionSnapshot) {
        self.store().transactions.push(snapshot);
    }

    /// Removes a transaction, e.g. a hold finalized elsewhere.
    pub fn remove(&self, id: &str) {
        self.store().transactions.retain(|t| t.id != id);
    }

    pub fn transaction(&self, id: &str) -> Option<TransactionSnapshot> {
        self.store().transactions.iter().find(|t| t.id == id).cloned()
    }

    pub fn transactions(&self) -> Vec<TransactionSnapshot> {
        self.store().transactions.clone()
    }

    /// Current availability of a batch.
    pub fn available(&self, batch_id: &str) -> Option<i64> {
        self.store()
            .products
            .iter()
            .find_map(|p| p.batch(batch_id))
            .map(|b| b.quantity_available)
    }

    /// Number of successful create/update calls.
    pub fn write_count(&self) -> usize {
        self.store().writes
    }
}

#[async_trait]
impl InvoicingService for MemoryInvoicingService {
    async fn fetch_inventory(&self) -> ClientResult<Vec<Product>> {
        let store = self.store();
        store.ensure_online()?;
        Ok(store.products.clone())
    }

    async fn fetch_held(&self) -> ClientResult<Vec<TransactionSnapshot>> {
        let store = self.store();
        store.ensure_online()?;
        let mut held: Vec<_> = store
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Hold)
            .cloned()
            .collect();
        held.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(held)
    }

    async fn fetch_transaction(&self, id: &str) -> ClientResult<TransactionSnapshot> {
        let store = self.store();
        store.ensure_online()?;
        store
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("transaction {}", id)))
    }

    async fn create_transaction(&self, draft: &TransactionDraft) -> ClientResult<String> {
        let mut store = self.store();
        store.ensure_online()?;
        if draft.items.is_empty() {
            return Err(ClientError::Validation("transaction has no items".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = store.next_timestamp();
        store.apply_stock(draft);
        store.transactions.push(TransactionSnapshot {
            id: id.clone(),
            status: draft.status,
            created_at,
            adjustment: draft.adjustment,
            items: snapshot_items(draft),
            return_of: draft.return_of.clone(),
        });
        store.writes += 1;

        debug!(id = %id, status = ?draft.status, "Memory service created transaction");
        Ok(id)
    }

    async fn update_transaction(&self, id: &str, draft: &TransactionDraft) -> ClientResult<String> {
        let mut store = self.store();
        store.ensure_online()?;
        if draft.items.is_empty() {
            return Err(ClientError::Validation("transaction has no items".to_string()));
        }

        let pos = store
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("transaction {}", id)))?;
        if store.transactions[pos].status != TransactionStatus::Hold {
            return Err(ClientError::Validation(format!(
                "transaction {} is already finalized",
                id
            )));
        }

        store.apply_stock(draft);
        let record = &mut store.transactions[pos];
        record.status = draft.status;
        record.adjustment = draft.adjustment;
        record.items = snapshot_items(draft);
        record.return_of = draft.return_of.clone();
        store.writes += 1;

        debug!(id, status = ?draft.status, "Memory service updated transaction");
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medix_core::{Batch, ConversionFactor, DraftItem, Money, PaymentMethod};

    fn inventory() -> Vec<Product> {
        vec![Product {
            id: "p1".to_string(),
            name: "Omeprazole 20mg".to_string(),
            base_unit: "capsule".to_string(),
            pack_unit: Some("box".to_string()),
            pack_factor: ConversionFactor::new(14).unwrap(),
            controlled: false,
            batches: vec![Batch {
                id: "b1".to_string(),
                product_id: "p1".to_string(),
                batch_number: "L-1".to_string(),
                quantity_available: 28,
                selling_price: Money::from_cents(90),
                expiry: None,
            }],
        }]
    }

    fn draft(status: TransactionStatus, quantity: i64) -> TransactionDraft {
        TransactionDraft {
            items: vec![DraftItem {
                product_id: "p1".to_string(),
                batch_id: "b1".to_string(),
                quantity,
                unit_price: Money::from_cents(90),
                discount_percent: None,
                discount_amount: None,
                total_price: Money::from_cents(90 * quantity),
            }],
            payment_method: (status != TransactionStatus::Hold).then_some(PaymentMethod::Cash),
            adjustment: Money::zero(),
            net_total: Money::from_cents(90 * quantity),
            tendered: Money::zero(),
            change: Money::zero(),
            status,
            return_of: None,
        }
    }

    #[tokio::test]
    async fn test_holds_are_newest_first_and_do_not_touch_stock() {
        let service = MemoryInvoicingService::new(inventory());
        let first = service.create_transaction(&draft(TransactionStatus::Hold, 2)).await.unwrap();
        let second = service.create_transaction(&draft(TransactionStatus::Hold, 3)).await.unwrap();

        let held = service.fetch_held().await.unwrap();
        assert_eq!(held[0].id, second);
        assert_eq!(held[1].id, first);
        assert_eq!(service.available("b1"), Some(28));
    }

    #[tokio::test]
    async fn test_commit_moves_stock() {
        let service = MemoryInvoicingService::new(inventory());
        let hold = service.create_transaction(&draft(TransactionStatus::Hold, 14)).await.unwrap();
        service
            .update_transaction(&hold, &draft(TransactionStatus::Paid, 14))
            .await
            .unwrap();
        assert_eq!(service.available("b1"), Some(14));
        assert!(service.fetch_held().await.unwrap().is_empty());

        service
            .create_transaction(&draft(TransactionStatus::Return, -4))
            .await
            .unwrap();
        assert_eq!(service.available("b1"), Some(18));
    }

    #[tokio::test]
    async fn test_finalized_transaction_cannot_be_updated() {
        let service = MemoryInvoicingService::new(inventory());
        let id = service.create_transaction(&draft(TransactionStatus::Paid, 1)).await.unwrap();
        assert!(matches!(
            service.update_transaction(&id, &draft(TransactionStatus::Paid, 1)).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let service = MemoryInvoicingService::new(inventory());
        service.set_offline(true);
        assert!(service.fetch_inventory().await.unwrap_err().is_transport());
        assert!(service
            .create_transaction(&draft(TransactionStatus::Hold, 1))
            .await
            .is_err());
        assert_eq!(service.write_count(), 0);
    }
}
