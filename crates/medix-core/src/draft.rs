//! # Transaction Draft
//!
//! The payload the terminal sends to the invoicing service on hold or
//! commit. Built from the cart, it is the only place operator units are
//! converted to base units.
//!
//! ```text
//! CartLine { Pack, qty 2, factor 10, base_rate 1.50, discount 10% }
//!      │
//!      ▼
//! DraftItem { quantity 20, unit_price 1.50, discount_percent 10%,
//!             total_price 27.00 }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::adjustment::Adjustment;
use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};
use crate::payment::Settlement;
use crate::types::{DiscountMode, PaymentMethod, TransactionStatus};

/// One line of the write payload, in base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftItem {
    pub product_id: String,
    pub batch_id: String,
    /// Base units, negative on returns.
    pub quantity: i64,
    /// Price per base unit.
    pub unit_price: Money,
    /// Set in Percent mode.
    pub discount_percent: Option<Percent>,
    /// Set in Value mode: the whole line's discount.
    pub discount_amount: Option<Money>,
    pub total_price: Money,
}

impl DraftItem {
    pub fn from_line(line: &CartLine, mode: DiscountMode) -> Self {
        let (discount_percent, discount_amount) = match mode {
            DiscountMode::Percent => (Some(Percent::from_bps(line.discount)), None),
            DiscountMode::Value => (None, Some(line.discount_amount(mode))),
        };

        DraftItem {
            product_id: line.product_id.clone(),
            batch_id: line.batch_id.clone(),
            quantity: line.units_consumed(),
            unit_price: line.base_rate,
            discount_percent,
            discount_amount,
            total_price: line.total(mode),
        }
    }
}

/// A create or update request for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDraft {
    pub items: Vec<DraftItem>,
    /// `None` for holds.
    pub payment_method: Option<PaymentMethod>,
    /// Signed adjustment total.
    pub adjustment: Money,
    pub net_total: Money,
    pub tendered: Money,
    pub change: Money,
    pub status: TransactionStatus,
    /// Id of the committed sale a return was loaded from.
    pub return_of: Option<String>,
}

impl TransactionDraft {
    /// A hold: no payment, status `hold`. A held return keeps its
    /// `return_of` so the eventual commit can still reference the sale.
    pub fn hold(
        cart: &Cart,
        adjustment: &Adjustment,
        return_of: Option<String>,
    ) -> CoreResult<Self> {
        let items = items(cart)?;
        Ok(TransactionDraft {
            items,
            payment_method: None,
            adjustment: adjustment.amount(),
            net_total: adjustment.net_total(cart.gross_total()),
            tendered: Money::zero(),
            change: Money::zero(),
            status: TransactionStatus::Hold,
            return_of,
        })
    }

    /// A committed sale or return, per the settlement's classification.
    pub fn commit(
        cart: &Cart,
        adjustment: &Adjustment,
        settlement: &Settlement,
        return_of: Option<String>,
    ) -> CoreResult<Self> {
        let items = items(cart)?;
        Ok(TransactionDraft {
            items,
            payment_method: Some(settlement.method),
            adjustment: adjustment.amount(),
            net_total: settlement.net_total,
            tendered: settlement.tendered,
            change: settlement.change,
            status: settlement.kind.into(),
            return_of,
        })
    }

    pub fn items_total(&self) -> Money {
        self.items.iter().map(|i| i.total_price).sum()
    }
}

fn items(cart: &Cart) -> CoreResult<Vec<DraftItem>> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    let mode = cart.config().discount_mode;
    Ok(cart
        .lines()
        .iter()
        .map(|line| DraftItem::from_line(line, mode))
        .collect())
}
