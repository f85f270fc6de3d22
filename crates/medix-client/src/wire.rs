//! # Wire Format
//!
//! JSON shapes exchanged with the invoicing service, and their mapping to
//! core types. Money travels as integer cents, percentages as basis points,
//! quantities in base units.
//!
//! ```text
//! GET  /api/inventory                 → [ProductDto]
//! GET  /api/transactions?status=hold  → [TransactionDto]  (newest first)
//! GET  /api/transactions/{id}         → TransactionDto
//! POST /api/transactions              ← TransactionWriteDto → WriteResponse
//! PUT  /api/transactions/{id}         ← TransactionWriteDto → WriteResponse
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use medix_core::{
    Batch, ConversionFactor, DraftItem, Money, PaymentMethod, Percent, Product, SnapshotItem,
    TransactionDraft, TransactionSnapshot, TransactionStatus,
};

use crate::error::ClientError;

// =============================================================================
// Inventory Read
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub base_unit: String,
    #[serde(default)]
    pub pack_unit: Option<String>,
    /// Missing means the product has no pack unit.
    #[serde(default)]
    pub conversion_factor: Option<u32>,
    #[serde(default)]
    pub is_controlled: bool,
    #[serde(default)]
    pub batches: Vec<BatchDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDto {
    pub id: String,
    pub batch_number: String,
    /// Base units on hand.
    pub quantity: i64,
    /// Cents per base unit.
    pub selling_price: i64,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl TryFrom<ProductDto> for Product {
    type Error = ClientError;

    fn try_from(dto: ProductDto) -> Result<Self, Self::Error> {
        let pack_factor = ConversionFactor::new(dto.conversion_factor.unwrap_or(1))
            .map_err(|e| ClientError::InvalidResponse(format!("product {}: {}", dto.id, e)))?;

        let batches = dto
            .batches
            .into_iter()
            .map(|b| Batch {
                id: b.id,
                product_id: dto.id.clone(),
                batch_number: b.batch_number,
                quantity_available: b.quantity,
                selling_price: Money::from_cents(b.selling_price),
                expiry: b.expiry_date,
            })
            .collect();

        Ok(Product {
            id: dto.id,
            name: dto.name,
            base_unit: dto.base_unit,
            pack_unit: dto.pack_unit,
            pack_factor,
            controlled: dto.is_controlled,
            batches,
        })
    }
}

impl From<&Product> for ProductDto {
    fn from(p: &Product) -> Self {
        ProductDto {
            id: p.id.clone(),
            name: p.name.clone(),
            base_unit: p.base_unit.clone(),
            pack_unit: p.pack_unit.clone(),
            conversion_factor: Some(p.pack_factor.get()),
            is_controlled: p.controlled,
            batches: p
                .batches
                .iter()
                .map(|b| BatchDto {
                    id: b.id.clone(),
                    batch_number: b.batch_number.clone(),
                    quantity: b.quantity_available,
                    selling_price: b.selling_price.cents(),
                    expiry_date: b.expiry,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Transaction Read
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub adjustment: i64,
    #[serde(default)]
    pub items: Vec<TransactionItemDto>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_of: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItemDto {
    pub product_id: String,
    pub batch_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

impl From<TransactionDto> for TransactionSnapshot {
    fn from(dto: TransactionDto) -> Self {
        TransactionSnapshot {
            id: dto.id,
            status: dto.status,
            created_at: dto.created_at,
            adjustment: Money::from_cents(dto.adjustment),
            items: dto
                .items
                .into_iter()
                .map(|i| SnapshotItem {
                    product_id: i.product_id,
                    batch_id: i.batch_id,
                    quantity: i.quantity,
                    unit_price: Money::from_cents(i.unit_price),
                    total_price: Money::from_cents(i.total_price),
                })
                .collect(),
            return_of: dto.return_of,
        }
    }
}

impl From<&TransactionSnapshot> for TransactionDto {
    fn from(s: &TransactionSnapshot) -> Self {
        TransactionDto {
            id: s.id.clone(),
            status: s.status,
            created_at: s.created_at,
            adjustment: s.adjustment.cents(),
            items: s
                .items
                .iter()
                .map(|i| TransactionItemDto {
                    product_id: i.product_id.clone(),
                    batch_id: i.batch_id.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price.cents(),
                    total_price: i.total_price.cents(),
                })
                .collect(),
            return_of: s.return_of.clone(),
        }
    }
}

// =============================================================================
// Transaction Write
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWriteDto {
    pub items: Vec<WriteItemDto>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment_method: Option<PaymentMethod>,
    /// Signed adjustment total, cents.
    pub discount: i64,
    pub net_total: i64,
    pub tendered: i64,
    pub change: i64,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_of: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteItemDto {
    pub product_id: String,
    pub batch_id: String,
    /// Base units.
    pub quantity: i64,
    pub unit_price: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub discount_bps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub discount_amount: Option<i64>,
    pub total_price: i64,
}

impl From<&DraftItem> for WriteItemDto {
    fn from(item: &DraftItem) -> Self {
        WriteItemDto {
            product_id: item.product_id.clone(),
            batch_id: item.batch_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.cents(),
            discount_bps: item.discount_percent.map(|p| p.bps()),
            discount_amount: item.discount_amount.map(|m| m.cents()),
            total_price: item.total_price.cents(),
        }
    }
}

impl From<&TransactionDraft> for TransactionWriteDto {
    fn from(draft: &TransactionDraft) -> Self {
        TransactionWriteDto {
            items: draft.items.iter().map(WriteItemDto::from).collect(),
            payment_method: draft.payment_method,
            discount: draft.adjustment.cents(),
            net_total: draft.net_total.cents(),
            tendered: draft.tendered.cents(),
            change: draft.change.cents(),
            status: draft.status,
            return_of: draft.return_of.clone(),
        }
    }
}

impl From<TransactionWriteDto> for TransactionDraft {
    fn from(dto: TransactionWriteDto) -> Self {
        TransactionDraft {
            items: dto
                .items
                .into_iter()
                .map(|i| DraftItem {
                    product_id: i.product_id,
                    batch_id: i.batch_id,
                    quantity: i.quantity,
                    unit_price: Money::from_cents(i.unit_price),
                    discount_percent: i.discount_bps.map(Percent::from_bps),
                    discount_amount: i.discount_amount.map(Money::from_cents),
                    total_price: Money::from_cents(i.total_price),
                })
                .collect(),
            payment_method: dto.payment_method,
            adjustment: Money::from_cents(dto.discount),
            net_total: Money::from_cents(dto.net_total),
            tendered: Money::from_cents(dto.tendered),
            change: Money::from_cents(dto.change),
            status: dto.status,
            return_of: dto.return_of,
        }
    }
}

/// Body of a successful create or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub id: String,
}
