//! Product repository and the conditional stock mutations used by the
//! order workflow.
//!
//! Stock moves are atomic conditional updates (`... WHERE stock >= $n`),
//! so two concurrent checkouts can never both take the last unit: one of
//! the two `UPDATE`s simply matches no row.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use copperleaf_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Product, Variant};

const PRODUCT_COLUMNS: &str = "id, name, description, image_url, category_id, price, mrp, \
     discount_percent, stock, has_variants, created_at, updated_at";

/// Filters for the product listing.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Parameters for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub mrp: Decimal,
    /// Ignored when `variants` is non-empty; the aggregate is then the sum
    /// of the variant stocks.
    pub stock: i32,
    pub variants: Vec<VariantInput>,
}

/// One variant line on a product create/update.
#[derive(Debug, Clone)]
pub struct VariantInput {
    pub size: String,
    pub color: String,
    pub stock: i32,
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products with optional category and search filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE TRUE"
        ));

        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(search) = &filter.search {
            qb.push(" AND name ILIKE ");
            qb.push_bind(format!("%{search}%"));
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(filter.limit.clamp(1, 100));
        qb.push(" OFFSET ");
        qb.push_bind(filter.offset.max(0));

        let products = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get all variants of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants(&self, id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(
            "SELECT id, product_id, size, color, stock
             FROM shop.product_variants
             WHERE product_id = $1
             ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// Create a product and its variants.
    ///
    /// The display discount is derived from (mrp, price); the aggregate
    /// stock is the variant sum when variants are present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a CHECK violation
    /// (`mrp >= price`), `RepositoryError::Database` otherwise.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_variants = !input.variants.is_empty();
        let stock = if has_variants {
            input.variants.iter().map(|v| v.stock).sum()
        } else {
            input.stock
        };
        let discount = discount_percent(input.mrp, input.price);

        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO shop.products
                 (name, description, image_url, category_id, price, mrp,
                  discount_percent, stock, has_variants)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.category_id)
        .bind(input.price)
        .bind(input.mrp)
        .bind(discount)
        .bind(stock)
        .bind(has_variants)
        .fetch_one(&mut *tx)
        .await
        .map_err(check_violation_to_conflict)?;

        for variant in &input.variants {
            sqlx::query(
                "INSERT INTO shop.product_variants (product_id, size, color, stock)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(product.id)
            .bind(&variant.size)
            .bind(&variant.color)
            .bind(variant.stock)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Replace a product's fields and variant set (admin edit).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_variants = !input.variants.is_empty();
        let stock = if has_variants {
            input.variants.iter().map(|v| v.stock).sum()
        } else {
            input.stock
        };
        let discount = discount_percent(input.mrp, input.price);

        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE shop.products
             SET name = $2, description = $3, image_url = $4, category_id = $5,
                 price = $6, mrp = $7, discount_percent = $8, stock = $9,
                 has_variants = $10, updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.category_id)
        .bind(input.price)
        .bind(input.mrp)
        .bind(discount)
        .bind(stock)
        .bind(has_variants)
        .fetch_optional(&mut *tx)
        .await
        .map_err(check_violation_to_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        // Admin edits replace the whole variant set.
        sqlx::query("DELETE FROM shop.product_variants WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for variant in &input.variants {
            sqlx::query(
                "INSERT INTO shop.product_variants (product_id, size, color, stock)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(&variant.size)
            .bind(&variant.color)
            .bind(variant.stock)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Derived display discount, whole percent. An invalid (price, mrp) pair
/// yields zero here and is rejected by the CHECK constraint on write.
fn discount_percent(mrp: Decimal, price: Decimal) -> Decimal {
    Price::new(price, mrp).map_or(Decimal::ZERO, |p| p.discount_percent())
}

fn check_violation_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_check_violation()
    {
        return RepositoryError::Conflict("mrp must be greater than or equal to price".to_owned());
    }
    RepositoryError::Database(e)
}

// ============================================================================
// Stock mutations (transaction-scoped)
// ============================================================================

/// Atomically take `quantity` units off a product's aggregate stock.
///
/// Returns the remaining stock, or `None` when the product had fewer than
/// `quantity` units (no row matched; nothing was written).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn try_decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<Option<i32>, RepositoryError> {
    let remaining = sqlx::query_scalar::<_, i32>(
        "UPDATE shop.products
         SET stock = stock - $2, updated_at = NOW()
         WHERE id = $1 AND stock >= $2
         RETURNING stock",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(remaining)
}

/// Atomically take `quantity` units off one variant's stock.
///
/// Returns the remaining variant stock, or `None` on shortfall.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn try_decrement_variant_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    size: &str,
    color: &str,
    quantity: i32,
) -> Result<Option<i32>, RepositoryError> {
    let remaining = sqlx::query_scalar::<_, i32>(
        "UPDATE shop.product_variants
         SET stock = stock - $4
         WHERE product_id = $1 AND size = $2 AND color = $3 AND stock >= $4
         RETURNING stock",
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(remaining)
}

/// Put `quantity` units back on a product's aggregate stock.
///
/// Returns `false` when the product no longer exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restore_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Put `quantity` units back on one variant's stock.
///
/// Returns `false` when no variant matched the (size, color) pair.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restore_variant_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    size: &str,
    color: &str,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.product_variants
         SET stock = stock + $4
         WHERE product_id = $1 AND size = $2 AND color = $3",
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Current stock of one variant, for shortfall error messages.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn variant_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    size: &str,
    color: &str,
) -> Result<Option<i32>, RepositoryError> {
    let stock = sqlx::query_scalar::<_, i32>(
        "SELECT stock FROM shop.product_variants
         WHERE product_id = $1 AND size = $2 AND color = $3",
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock)
}

/// Fetch a product inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_product(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_whole_percent_of_gap() {
        assert_eq!(
            discount_percent(Decimal::from(200), Decimal::from(150)),
            Decimal::from(25)
        );
        assert_eq!(discount_percent(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
