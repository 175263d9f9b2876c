//! Order persistence: live orders, line snapshots, and the checkout
//! replay guards (idempotency keys + the 5-minute duplicate window).

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor};

use copperleaf_core::{CancellationState, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{DeliveryAddress, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, total_amount, status, cancellation, delivery_address, \
     estimated_delivery, delivered_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name, price, image_url, quantity, size, color";

/// Duplicate-order cooldown window.
pub const DUPLICATE_WINDOW_SECS: i32 = 5 * 60;

/// A new order line, snapshotted from the product at purchase time.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: rust_decimal::Decimal,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub size: String,
    pub color: String,
}

/// Parameters for inserting an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: UserId,
    pub total_amount: rust_decimal::Decimal,
    pub delivery_address: DeliveryAddress,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<NewOrderItem>,
}

/// Insert an order and its lines inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails.
pub async fn create_order(
    conn: &mut PgConnection,
    params: &CreateOrder,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO shop.orders (user_id, total_amount, delivery_address, estimated_delivery)
         VALUES ($1, $2, $3, $4)
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(params.total_amount)
    .bind(Json(&params.delivery_address))
    .bind(params.estimated_delivery)
    .fetch_one(&mut *conn)
    .await?;

    for item in &params.items {
        sqlx::query(
            "INSERT INTO shop.order_items
                 (order_id, product_id, name, price, image_url, quantity, size, color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order.id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.image_url)
        .bind(item.quantity)
        .bind(&item.size)
        .bind(&item.color)
        .execute(&mut *conn)
        .await?;
    }

    Ok(order)
}

/// Get an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_order<'e, E: PgExecutor<'e>>(
    executor: E,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let order =
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

    Ok(order)
}

/// Get the lines of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_order_items<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM shop.order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

/// List a user's orders, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_orders_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(orders)
}

/// List all live orders (admin), newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all_orders<'e, E: PgExecutor<'e>>(
    executor: E,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.orders ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit.clamp(1, 200))
    .bind(offset.max(0))
    .fetch_all(executor)
    .await?;

    Ok(orders)
}

/// Move an order to a new status; stamps `delivered_at` on delivery.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn update_order_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.orders
         SET status = $2,
             delivered_at = CASE WHEN $2 = 'delivered'::shop.order_status THEN NOW() ELSE delivered_at END,
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Replace the cancellation sub-state.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn set_cancellation(
    conn: &mut PgConnection,
    id: OrderId,
    state: &CancellationState,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE shop.orders SET cancellation = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(state))
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Delete a live order (lines cascade).
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn delete_order(conn: &mut PgConnection, id: OrderId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM shop.orders WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Find a recent Pending/Processing order by the same user sharing at
/// least one of the given products, inside the cooldown window.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_duplicate_order(
    conn: &mut PgConnection,
    user_id: UserId,
    product_ids: &[ProductId],
) -> Result<Option<OrderId>, RepositoryError> {
    let raw_ids: Vec<i32> = product_ids.iter().map(|p| p.as_i32()).collect();

    let order_id = sqlx::query_scalar::<_, OrderId>(
        "SELECT o.id
         FROM shop.orders o
         JOIN shop.order_items i ON i.order_id = o.id
         WHERE o.user_id = $1
           AND o.status IN ('pending', 'processing')
           AND o.created_at > NOW() - make_interval(secs => $2)
           AND i.product_id = ANY($3)
         LIMIT 1",
    )
    .bind(user_id)
    .bind(f64::from(DUPLICATE_WINDOW_SECS))
    .bind(&raw_ids)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order_id)
}

/// Look up an order previously created under this idempotency key.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_order_by_idempotency_key(
    conn: &mut PgConnection,
    user_id: UserId,
    key: &str,
) -> Result<Option<OrderId>, RepositoryError> {
    let order_id = sqlx::query_scalar::<_, OrderId>(
        "SELECT order_id FROM shop.order_idempotency_keys WHERE user_id = $1 AND key = $2",
    )
    .bind(user_id)
    .bind(key)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order_id)
}

/// Record the idempotency key for a freshly created order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn record_idempotency_key(
    conn: &mut PgConnection,
    user_id: UserId,
    key: &str,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.order_idempotency_keys (key, user_id, order_id) VALUES ($1, $2, $3)",
    )
    .bind(key)
    .bind(user_id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DUPLICATE_WINDOW_SECS;

    // The window is bound to make_interval(secs => ...), which takes a
    // double precision argument.
    #[test]
    fn duplicate_window_converts_losslessly_to_interval_seconds() {
        assert_eq!(f64::from(DUPLICATE_WINDOW_SECS), 300.0);
    }
}
