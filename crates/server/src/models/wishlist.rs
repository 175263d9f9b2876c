//! Wishlist domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copperleaf_core::{ProductId, UserId, WishlistItemId};

/// One wishlist entry, keyed by (product, size, color).
///
/// No price snapshot: the live product price is read at render or
/// move-to-cart time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}
