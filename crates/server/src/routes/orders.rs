//! Order handlers: checkout, history, status updates, and the
//! cancellation flows.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use copperleaf_core::{OrderId, OrderStatusTarget, UserRole};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{CancelledOrder, Order};
use crate::response::ApiResponse;
use crate::services::orders::{OrderDetail, PlaceOrderInput, StatusUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestCancelBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: OrderStatusTarget,
    #[serde(default)]
    pub admin_reason: Option<String>,
}

/// `POST /api/orders`
pub async fn place(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<PlaceOrderInput>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let detail = state.orders.place_order(user.id, body).await?;
    Ok(Json(ApiResponse::ok("Order placed", detail)))
}

/// `GET /api/orders`
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = db::orders::list_orders_for_user(&state.pool, user.id).await?;
    Ok(Json(ApiResponse::ok("Orders", orders)))
}

/// `GET /api/orders/all` (admin)
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = db::orders::list_all_orders(&state.pool, page.limit, page.offset).await?;
    Ok(Json(ApiResponse::ok("Orders", orders)))
}

/// `GET /api/orders/cancelled` (admin)
pub async fn cancelled(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CancelledOrder>>>> {
    let archived =
        db::cancelled_orders::list_cancelled(&state.pool, page.limit, page.offset).await?;
    Ok(Json(ApiResponse::ok("Cancelled orders", archived)))
}

/// `GET /api/orders/{id}` (owner or admin)
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = db::orders::get_order(&state.pool, id)
        .await?
        .filter(|o| o.user_id == user.id || user.role == UserRole::Admin)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    let items = db::orders::get_order_items(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok("Order", OrderDetail { order, items })))
}

/// `DELETE /api/orders/{id}` — user cancel, Pending only.
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<ApiResponse<()>>> {
    let reason = body.and_then(|Json(b)| b.reason);
    state.orders.cancel_by_user(user.id, id, reason).await?;
    Ok(Json(ApiResponse::message("Order cancelled")))
}

/// `POST /api/orders/request-cancel/{id}` — Processing only.
pub async fn request_cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
    Json(body): Json<RequestCancelBody>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .orders
        .request_cancellation(user.id, id, body.reason)
        .await?;
    Ok(Json(ApiResponse::message(
        "Cancellation request submitted for review",
    )))
}

/// `PUT /api/orders/{id}` (admin) — status move or cancellation review.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<ApiResponse<()>>> {
    let outcome = state
        .orders
        .update_status(id, body.status, body.admin_reason)
        .await?;

    let message = match outcome {
        StatusUpdate::Moved(status) => format!("Order moved to {status}"),
        StatusUpdate::RequestApproved => "Cancellation request approved; order cancelled".to_owned(),
        StatusUpdate::RequestRejected => "Cancellation request rejected".to_owned(),
        StatusUpdate::Cancelled => "Order cancelled".to_owned(),
    };

    Ok(Json(ApiResponse::message(message)))
}
