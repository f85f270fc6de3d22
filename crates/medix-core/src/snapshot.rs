//! # Snapshot Reconstruction
//!
//! Turns persisted transaction items back into cart lines.
//!
//! The invoicing service stores each item in base units with its unit price
//! and final total, but not the discount the operator typed. Loading a hold
//! therefore infers the discount from the price delta:
//!
//! ```text
//! gross = unit_price × quantity
//! total < gross  →  Percent mode: discount = (1 − total / gross) × 100%
//!                   Value mode:   discount = (gross − total) / quantity
//! otherwise      →  discount = 0
//! ```
//!
//! The inference is lossy: rounding in the stored total, a pack unit, or a
//! discount-mode change since the hold was written all come back as a base
//! unit line with an approximate discount. [`reconstruct_from_snapshot`] is
//! the only place this happens so a service that stores discounts
//! explicitly can replace it wholesale.
//!
//! Loading a committed sale for a return is a separate, deliberately cruder
//! mapping: quantities are negated, the unit is Base and the discount is
//! dropped, see [`lines_for_return`].

use crate::cart::CartLine;
use crate::money::{Money, Percent};
use crate::stock::StockSnapshot;
use crate::types::{DiscountMode, SnapshotItem, TransactionKind, UnitType};
use crate::unit::ConversionFactor;

/// Infers a line discount (in hundredths, see [`CartLine::discount`]) from a
/// persisted item.
///
/// Magnitudes are compared so a held return infers the same figure as the
/// equivalent sale.
pub fn infer_discount(item: &SnapshotItem, mode: DiscountMode) -> i64 {
    discount_from_totals(item.gross(), item.total_price, item.quantity, item.unit_price, mode)
}

fn discount_from_totals(
    gross: Money,
    total: Money,
    quantity: i64,
    rate: Money,
    mode: DiscountMode,
) -> i64 {
    let gross = gross.abs();
    let total = total.abs();
    if quantity == 0 || total >= gross {
        return 0;
    }

    let delta = gross - total;
    match mode {
        DiscountMode::Percent => Percent::from_ratio(delta, gross)
            .map(|p| p.bps().clamp(0, Percent::FULL.bps()))
            .unwrap_or(0),
        DiscountMode::Value => delta
            .per_unit(quantity.abs())
            .map(|m| m.cents().clamp(0, rate.abs().cents()))
            .unwrap_or(0),
    }
}

/// Rebuilds cart lines from a held transaction's items.
///
/// Lines come back in Base units. Display name, pack factor and control
/// flag are taken from `stock` when the product is still known. Items on the
/// same batch are merged, and the discount is inferred from their combined
/// gross and total. The returned kind is `Return` when every line is
/// negative.
pub fn reconstruct_from_snapshot(
    items: &[SnapshotItem],
    mode: DiscountMode,
    stock: &StockSnapshot,
) -> (TransactionKind, Vec<CartLine>) {
    // (line, summed gross, summed persisted total)
    let mut merged: Vec<(CartLine, Money, Money)> = Vec::with_capacity(items.len());

    for item in items.iter().filter(|i| i.quantity != 0) {
        match merged.iter_mut().find(|(l, _, _)| l.batch_id == item.batch_id) {
            Some((line, gross, total)) => {
                line.quantity += item.quantity;
                *gross += item.gross();
                *total += item.total_price;
            }
            None => merged.push((base_line(item, stock), item.gross(), item.total_price)),
        }
    }

    let lines: Vec<CartLine> = merged
        .into_iter()
        .filter(|(line, _, _)| line.quantity != 0)
        .map(|(mut line, gross, total)| {
            line.discount = discount_from_totals(gross, total, line.quantity, line.base_rate, mode);
            line
        })
        .collect();

    let kind = if !lines.is_empty() && lines.iter().all(|l| l.quantity < 0) {
        TransactionKind::Return
    } else {
        TransactionKind::Sale
    };

    (kind, lines)
}

/// Mirrors a committed sale's items as return lines.
///
/// Every quantity becomes negative, units reset to Base and discounts are
/// dropped, so the refund is the undiscounted price.
pub fn lines_for_return(items: &[SnapshotItem], stock: &StockSnapshot) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(items.len());

    for item in items.iter().filter(|i| i.quantity != 0) {
        let quantity = -item.quantity.abs();
        if let Some(existing) = lines.iter_mut().find(|l| l.batch_id == item.batch_id) {
            existing.quantity += quantity;
            continue;
        }
        let mut line = base_line(item, stock);
        line.quantity = quantity;
        lines.push(line);
    }

    lines
}

fn base_line(item: &SnapshotItem, stock: &StockSnapshot) -> CartLine {
    let product = stock.product(&item.product_id);
    CartLine {
        product_id: item.product_id.clone(),
        product_name: product
            .map(|p| p.name.clone())
            .unwrap_or_else(|| item.product_id.clone()),
        batch_id: item.batch_id.clone(),
        unit: UnitType::Base,
        quantity: item.quantity,
        base_rate: item.unit_price,
        discount: 0,
        factor: product
            .map(|p| p.pack_factor)
            .unwrap_or(ConversionFactor::NONE),
        controlled: product.map(|p| p.controlled).unwrap_or(false),
    }
}

/// Sum of `total_price` the reconstructed lines are expected to approximate.
pub fn persisted_total(items: &[SnapshotItem]) -> Money {
    items.iter().map(|i| i.total_price).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(batch: &str, quantity: i64, unit_cents: i64, total_cents: i64) -> SnapshotItem {
        SnapshotItem {
            product_id: "p1".to_string(),
            batch_id: batch.to_string(),
            quantity,
            unit_price: Money::from_cents(unit_cents),
            total_price: Money::from_cents(total_cents),
        }
    }

    fn empty_stock() -> StockSnapshot {
        StockSnapshot::empty(Utc::now())
    }

    #[test]
    fn test_infer_percent_discount() {
        // 5 × 20.00 = 100.00 persisted as 90.00
        let it = item("b1", 5, 2_000, 9_000);
        assert_eq!(infer_discount(&it, DiscountMode::Percent), 1_000);
        assert_eq!(infer_discount(&it, DiscountMode::Value), 200);
    }

    #[test]
    fn test_infer_no_discount_when_total_not_below_gross() {
        assert_eq!(infer_discount(&item("b1", 5, 2_000, 10_000), DiscountMode::Percent), 0);
        assert_eq!(infer_discount(&item("b1", 5, 2_000, 12_000), DiscountMode::Percent), 0);
    }

    #[test]
    fn test_infer_negative_hold_matches_sale() {
        let it = item("b1", -5, 2_000, -9_000);
        assert_eq!(infer_discount(&it, DiscountMode::Percent), 1_000);
    }

    #[test]
    fn test_reconstruct_round_trip_is_approximate() {
        // 3 × 3.33 = 9.99, stored after a discount as 8.99
        let items = vec![item("b1", 3, 333, 899)];

        let (kind, lines) = reconstruct_from_snapshot(&items, DiscountMode::Percent, &empty_stock());
        assert_eq!(kind, TransactionKind::Sale);
        assert_eq!(lines[0].unit, UnitType::Base);
        assert_eq!(lines[0].discount, 1_001);

        // 1.00 / 3 rounds to 0.33 per unit, so the total drifts by a cent.
        let (_, lines) = reconstruct_from_snapshot(&items, DiscountMode::Value, &empty_stock());
        assert_eq!(lines[0].discount, 33);
        assert_eq!(lines[0].total(DiscountMode::Value), Money::from_cents(900));
        assert_ne!(lines[0].total(DiscountMode::Value), persisted_total(&items));
    }

    #[test]
    fn test_reconstruct_all_negative_is_return() {
        let items = vec![item("b1", -2, 100, -200), item("b2", -1, 100, -100)];
        let (kind, lines) = reconstruct_from_snapshot(&items, DiscountMode::Percent, &empty_stock());
        assert_eq!(kind, TransactionKind::Return);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_reconstruct_merges_same_batch() {
        let items = vec![item("b1", 2, 100, 200), item("b1", 3, 100, 300)];
        let (_, lines) = reconstruct_from_snapshot(&items, DiscountMode::Percent, &empty_stock());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_merged_items_share_one_inferred_discount() {
        // A discounted 5-tablet line and an undiscounted strip of 20.
        let items = vec![item("b1", 5, 100, 450), item("b1", 20, 100, 2_000)];

        let (_, lines) = reconstruct_from_snapshot(&items, DiscountMode::Percent, &empty_stock());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 25);
        assert_eq!(lines[0].discount, 200);
        assert_eq!(lines[0].total(DiscountMode::Percent), persisted_total(&items));

        let (_, lines) = reconstruct_from_snapshot(&items, DiscountMode::Value, &empty_stock());
        assert_eq!(lines[0].discount, 2);
        assert_eq!(lines[0].total(DiscountMode::Value), persisted_total(&items));
    }

    #[test]
    fn test_lines_for_return_discards_discount() {
        let items = vec![item("b1", 5, 2_000, 9_000)];
        let lines = lines_for_return(&items, &empty_stock());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, -5);
        assert_eq!(lines[0].base_rate, Money::from_cents(2_000));
        assert_eq!(lines[0].discount, 0);
        assert_eq!(lines[0].total(DiscountMode::Percent), Money::from_cents(-10_000));
    }
}
