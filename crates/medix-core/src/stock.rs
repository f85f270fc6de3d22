//! # Stock Snapshot
//!
//! A locally cached copy of the inventory read.
//!
//! The snapshot is **stale by construction**: it is fetched at startup and
//! after each hold or commit, never re-validated at commit time, and never
//! re-fetched implicitly. Two terminals selling from the same batch can both
//! pass the local check and overcommit; the invoicing service stays the
//! authority on stock.
//!
//! ```text
//! fetch ──► StockSnapshot { fetched_at } ──► cart stock checks
//!                │
//!                └── age(now) > staleness window?  → caller may warn,
//!                                                     nothing re-fetches
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::types::{Batch, Product};

/// Default staleness window before the terminal warns about the snapshot.
pub const DEFAULT_STALENESS_SECS: i64 = 300;

/// Products and batches as of `fetched_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    products: Vec<Product>,
    fetched_at: DateTime<Utc>,
}

impl StockSnapshot {
    pub fn new(products: Vec<Product>, fetched_at: DateTime<Utc>) -> Self {
        StockSnapshot {
            products,
            fetched_at,
        }
    }

    /// A snapshot with no products, e.g. before the first successful read.
    pub fn empty(fetched_at: DateTime<Utc>) -> Self {
        StockSnapshot::new(Vec::new(), fetched_at)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Finds a batch and its owning product.
    pub fn find_batch(&self, batch_id: &str) -> Option<(&Product, &Batch)> {
        self.products
            .iter()
            .find_map(|p| p.batch(batch_id).map(|b| (p, b)))
    }

    /// Cached availability of a batch in base units.
    pub fn available(&self, batch_id: &str) -> Option<i64> {
        self.find_batch(batch_id).map(|(_, b)| b.quantity_available)
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) > window
    }

    pub fn batch_count(&self) -> usize {
        self.products.iter().map(|p| p.batches.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::unit::ConversionFactor;

    fn snapshot(now: DateTime<Utc>) -> StockSnapshot {
        let product = Product {
            id: "p1".to_string(),
            name: "Amoxicillin 250mg".to_string(),
            base_unit: "capsule".to_string(),
            pack_unit: Some("box".to_string()),
            pack_factor: ConversionFactor::new(20).unwrap(),
            controlled: false,
            batches: vec![Batch {
                id: "b1".to_string(),
                product_id: "p1".to_string(),
                batch_number: "LOT-1".to_string(),
                quantity_available: 40,
                selling_price: Money::from_cents(150),
                expiry: None,
            }],
        };
        StockSnapshot::new(vec![product], now)
    }

    #[test]
    fn test_find_batch() {
        let snap = snapshot(Utc::now());
        let (product, batch) = snap.find_batch("b1").unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(batch.batch_number, "LOT-1");
        assert_eq!(snap.available("b1"), Some(40));
        assert_eq!(snap.available("missing"), None);
        assert_eq!(snap.batch_count(), 1);
    }

    #[test]
    fn test_staleness() {
        let fetched = Utc::now();
        let snap = snapshot(fetched);
        let window = Duration::seconds(DEFAULT_STALENESS_SECS);

        assert!(!snap.is_stale(fetched + Duration::seconds(10), window));
        assert!(snap.is_stale(fetched + Duration::seconds(301), window));
    }
}
