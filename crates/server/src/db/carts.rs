//! Cart repository.
//!
//! Lines are keyed by the (user, product, size, color) composite identity.
//! Adding an existing key bumps the quantity but keeps the original price
//! snapshot.

use sqlx::{PgConnection, PgPool};

use copperleaf_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartItem, Product};

const CART_COLUMNS: &str = "id, user_id, product_id, size, color, quantity, price_at_add, \
     mrp_at_add, discount_at_add, created_at";

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All cart lines for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {CART_COLUMNS} FROM shop.cart_items WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Add a line, snapshotting the product's current price/mrp/discount.
    /// An existing (product, size, color) line gains quantity instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product: &Product,
        size: &str,
        color: &str,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(&format!(
            "INSERT INTO shop.cart_items
                 (user_id, product_id, size, color, quantity,
                  price_at_add, mrp_at_add, discount_at_add)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id, product_id, size, color)
             DO UPDATE SET quantity = shop.cart_items.quantity + EXCLUDED.quantity
             RETURNING {CART_COLUMNS}"
        ))
        .bind(user_id)
        .bind(product.id)
        .bind(size)
        .bind(color)
        .bind(quantity)
        .bind(product.price)
        .bind(product.mrp)
        .bind(product.discount_percent)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no matching line exists.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        color: &str,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.cart_items SET quantity = $5
             WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(color)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove one line by its composite identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no matching line exists.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        color: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM shop.cart_items
             WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(color)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

/// Remove exactly the purchased lines inside the checkout transaction
/// (partial checkout: remaining cart lines stay put).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a delete fails.
pub async fn remove_purchased(
    conn: &mut PgConnection,
    user_id: UserId,
    lines: &[(ProductId, String, String)],
) -> Result<(), RepositoryError> {
    for (product_id, size, color) in lines {
        sqlx::query(
            "DELETE FROM shop.cart_items
             WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4",
        )
        .bind(user_id)
        .bind(*product_id)
        .bind(size)
        .bind(color)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Drop the whole cart inside the checkout transaction (full checkout).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_cart(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
