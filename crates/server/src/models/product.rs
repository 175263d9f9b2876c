//! Product and variant domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use copperleaf_core::{CategoryId, ProductId, VariantId};

/// A sellable product.
///
/// `stock` is the aggregate quantity across all variants. When
/// `has_variants` is true, each variant row tracks its own stock and the
/// two are always moved together by the order workflow.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Selling price. Invariant: `mrp >= price`, enforced by a CHECK.
    pub price: Decimal,
    /// Strike-through reference price.
    pub mrp: Decimal,
    /// Display discount, derived from `mrp` and `price` on writes.
    pub discount_percent: Decimal,
    /// Aggregate stock across variants (or the only stock when
    /// `has_variants` is false). Never negative.
    pub stock: i32,
    pub has_variants: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A (size, color) stock-tracked sub-unit of a product.
///
/// Unspecified dimensions are stored as empty strings rather than NULL so
/// the (product, size, color) uniqueness constraint holds.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub stock: i32,
}
