//! Notification domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copperleaf_core::{NotificationId, NotificationKind, OrderId, UserId};

/// A per-user inbox record.
///
/// Created by the order workflow (and other subsystems); the only
/// permitted mutation afterwards is flipping `read`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    /// Optional in-app link target.
    pub link: Option<String>,
    /// Order this notification refers to, for order-kind records.
    pub order_id: Option<OrderId>,
    /// 1 (lowest) through 5 (highest).
    pub priority: i16,
    pub created_at: DateTime<Utc>,
}
