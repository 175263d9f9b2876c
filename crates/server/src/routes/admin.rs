//! Admin-only bulk operations and account moderation.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use copperleaf_core::{CancelledOrderId, OrderId, OrderStatusTarget, UserId};

use crate::db::{self, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::response::ApiResponse;
use crate::services::orders::{BulkCancelOutcome, BulkOutcome, BulkUpdateOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkUpdateBody {
    pub order_ids: Vec<OrderId>,
    pub status: OrderStatusTarget,
}

#[derive(Debug, Deserialize)]
pub struct BulkCancelBody {
    pub order_ids: Vec<OrderId>,
    #[serde(default)]
    pub admin_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCancelledBody {
    pub ids: Vec<CancelledOrderId>,
}

#[derive(Debug, Deserialize)]
pub struct BlockBody {
    pub blocked: bool,
}

/// `PUT /api/admin/orders/bulk-update`
pub async fn bulk_update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<BulkUpdateBody>,
) -> Result<Json<ApiResponse<Vec<BulkOutcome<BulkUpdateOutcome>>>>> {
    if body.order_ids.is_empty() {
        return Err(AppError::Validation("No order ids given".to_owned()));
    }

    let outcomes = state
        .orders
        .bulk_update_status(&body.order_ids, body.status)
        .await?;

    Ok(Json(ApiResponse::ok("Bulk update complete", outcomes)))
}

/// `PUT /api/admin/orders/bulk-cancel`
pub async fn bulk_cancel(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<BulkCancelBody>,
) -> Result<Json<ApiResponse<Vec<BulkOutcome<BulkCancelOutcome>>>>> {
    if body.order_ids.is_empty() {
        return Err(AppError::Validation("No order ids given".to_owned()));
    }

    let outcomes = state
        .orders
        .bulk_cancel(&body.order_ids, body.admin_reason.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok("Bulk cancel complete", outcomes)))
}

/// `DELETE /api/admin/orders/cancelled` — bulk delete archive rows.
pub async fn delete_cancelled(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DeleteCancelledBody>,
) -> Result<Json<ApiResponse<u64>>> {
    if body.ids.is_empty() {
        return Err(AppError::Validation("No archive ids given".to_owned()));
    }

    let removed = db::cancelled_orders::delete_cancelled(&state.pool, &body.ids).await?;

    tracing::info!(removed, "Archive rows deleted");
    Ok(Json(ApiResponse::ok("Archive rows deleted", removed)))
}

/// `PUT /api/admin/users/{id}/block`
pub async fn set_blocked(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<BlockBody>,
) -> Result<Json<ApiResponse<()>>> {
    UserRepository::new(&state.pool)
        .set_blocked(id, body.blocked)
        .await?;

    let message = if body.blocked {
        "Account blocked"
    } else {
        "Account unblocked"
    };
    Ok(Json(ApiResponse::message(message)))
}
