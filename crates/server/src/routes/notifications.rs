//! Notification inbox handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use copperleaf_core::NotificationId;

use crate::db::NotificationRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Notification;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// `GET /api/notifications`
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<InboxQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let items = NotificationRepository::new(&state.pool)
        .list_for_user(user.id, query.unread_only)
        .await?;
    Ok(Json(ApiResponse::ok("Notifications", items)))
}

/// `PUT /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<()>>> {
    NotificationRepository::new(&state.pool)
        .mark_read(user.id, id)
        .await?;
    Ok(Json(ApiResponse::message("Notification marked read")))
}

/// `PUT /api/notifications/read-all`
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<u64>>> {
    let count = NotificationRepository::new(&state.pool)
        .mark_all_read(user.id)
        .await?;
    Ok(Json(ApiResponse::ok("All notifications marked read", count)))
}
