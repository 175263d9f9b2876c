//! Cart domain types.
//!
//! A cart is the set of `cart_items` rows for one user; there is no cart
//! header row. Totals are always derived from the items on read, never
//! stored, so they cannot drift.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use copperleaf_core::{CartItemId, ProductId, UserId};

/// One cart line, keyed by the (product, size, color) composite identity.
///
/// Prices are snapshotted at the time the item is added; the live product
/// price may have moved since.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub price_at_add: Decimal,
    pub mrp_at_add: Decimal,
    pub discount_at_add: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Derived cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_amount: Decimal,
    pub total_mrp: Decimal,
    pub total_additional_discount: Decimal,
}

impl CartTotals {
    /// Recompute totals from the items. The additional discount is the gap
    /// between the MRP total and the selling total.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let mut total_amount = Decimal::ZERO;
        let mut total_mrp = Decimal::ZERO;
        for item in items {
            let qty = Decimal::from(item.quantity);
            total_amount += item.price_at_add * qty;
            total_mrp += item.mrp_at_add * qty;
        }
        Self {
            total_amount,
            total_mrp,
            total_additional_discount: total_mrp - total_amount,
        }
    }
}

/// Cart payload returned by the API: items plus derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartItem>) -> Self {
        let totals = CartTotals::from_items(&items);
        Self { items, totals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, price: i64, mrp: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(1),
            user_id: UserId::new(1),
            product_id: ProductId::new(1),
            size: String::new(),
            color: String::new(),
            quantity,
            price_at_add: Decimal::from(price),
            mrp_at_add: Decimal::from(mrp),
            discount_at_add: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn totals_are_recomputed_from_items() {
        let totals = CartTotals::from_items(&[item(2, 100, 150), item(1, 50, 50)]);
        assert_eq!(totals.total_amount, Decimal::from(250));
        assert_eq!(totals.total_mrp, Decimal::from(350));
        assert_eq!(totals.total_additional_discount, Decimal::from(100));
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let totals = CartTotals::from_items(&[]);
        assert_eq!(totals.total_amount, Decimal::ZERO);
        assert_eq!(totals.total_additional_discount, Decimal::ZERO);
    }
}
