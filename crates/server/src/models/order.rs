//! Order, order line, and archive domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use copperleaf_core::{
    CancellationSource, CancellationState, CancelledOrderId, OrderId, OrderItemId, OrderStatus,
    ProductId, UserId,
};

/// Delivery address snapshot frozen onto the order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A live order.
///
/// Lives in the `orders` table only while active: termination either
/// reaches `Delivered` or moves the order into [`CancelledOrder`] and
/// deletes this row. The two are mutually exclusive.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    /// Cancellation sub-state, stored as tagged JSONB.
    pub cancellation: Json<CancellationState>,
    pub delivery_address: Json<DeliveryAddress>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on a live order. Name, price, and image are snapshots frozen at
/// purchase time; later product edits never rewrite history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub quantity: i32,
    /// Empty string when the product has no size dimension.
    pub size: String,
    /// Empty string when the product has no color dimension.
    pub color: String,
}

/// Line snapshot embedded in the archive as JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub size: String,
    pub color: String,
}

impl From<&OrderItem> for OrderItemSnapshot {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            quantity: item.quantity,
            size: item.size.clone(),
            color: item.color.clone(),
        }
    }
}

/// Append-only record of a terminated order.
///
/// Created only by the cancellation workflow and never mutated afterwards,
/// except by bulk admin delete.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CancelledOrder {
    pub id: CancelledOrderId,
    /// Id the order had while it was live.
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Json<Vec<OrderItemSnapshot>>,
    pub total_amount: Decimal,
    pub delivery_address: Json<DeliveryAddress>,
    pub source: CancellationSource,
    /// User-supplied reason, when one was given.
    pub reason: Option<String>,
    /// Admin note attached on approval or admin-initiated cancellation.
    pub admin_reason: Option<String>,
    pub order_created_at: DateTime<Utc>,
    pub cancelled_at: DateTime<Utc>,
}
