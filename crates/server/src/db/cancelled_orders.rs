//! The append-only archive of terminated orders.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use copperleaf_core::{CancellationSource, CancelledOrderId};

use super::RepositoryError;
use crate::models::{CancelledOrder, Order, OrderItem, OrderItemSnapshot};

const ARCHIVE_COLUMNS: &str = "id, order_id, user_id, items, total_amount, delivery_address, \
     source, reason, admin_reason, order_created_at, cancelled_at";

/// Snapshot a live order into the archive, inside an open transaction.
///
/// The caller deletes the live row afterwards; an order id appears in the
/// archive exactly once.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` when the order was already archived
/// and `RepositoryError::Database` for other failures.
pub async fn archive_order(
    conn: &mut PgConnection,
    order: &Order,
    items: &[OrderItem],
    source: CancellationSource,
    reason: Option<&str>,
    admin_reason: Option<&str>,
) -> Result<CancelledOrder, RepositoryError> {
    let snapshots: Vec<OrderItemSnapshot> = items.iter().map(OrderItemSnapshot::from).collect();

    let archived = sqlx::query_as::<_, CancelledOrder>(&format!(
        "INSERT INTO shop.cancelled_orders
             (order_id, user_id, items, total_amount, delivery_address,
              source, reason, admin_reason, order_created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {ARCHIVE_COLUMNS}"
    ))
    .bind(order.id)
    .bind(order.user_id)
    .bind(Json(&snapshots))
    .bind(order.total_amount)
    .bind(&order.delivery_address)
    .bind(source)
    .bind(reason)
    .bind(admin_reason)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("Order is already archived".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Ok(archived)
}

/// List archived orders (admin), newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_cancelled(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<CancelledOrder>, RepositoryError> {
    let archived = sqlx::query_as::<_, CancelledOrder>(&format!(
        "SELECT {ARCHIVE_COLUMNS} FROM shop.cancelled_orders
         ORDER BY cancelled_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit.clamp(1, 200))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await?;

    Ok(archived)
}

/// Bulk delete archive rows (the one mutation the archive allows).
///
/// Returns how many rows were removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_cancelled(
    pool: &PgPool,
    ids: &[CancelledOrderId],
) -> Result<u64, RepositoryError> {
    let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();

    let result = sqlx::query("DELETE FROM shop.cancelled_orders WHERE id = ANY($1)")
        .bind(&raw_ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
