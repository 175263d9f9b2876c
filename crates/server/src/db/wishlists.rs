//! Wishlist repository.

use sqlx::PgPool;

use copperleaf_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::WishlistItem;

const WISHLIST_COLUMNS: &str = "id, user_id, product_id, size, color, created_at";

/// Repository for wishlist operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All wishlist lines for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items = sqlx::query_as::<_, WishlistItem>(&format!(
            "SELECT {WISHLIST_COLUMNS} FROM shop.wishlist_items
             WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Add a line; adding an already-present key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        color: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.wishlist_items (user_id, product_id, size, color)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id, size, color) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(color)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove every line for a product, whatever its dimensions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not on the
    /// wishlist at all.
    pub async fn remove_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM shop.wishlist_items
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
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
            "DELETE FROM shop.wishlist_items
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
}
