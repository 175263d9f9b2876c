//! Notification repository.

use sqlx::PgPool;

use copperleaf_core::{NotificationId, NotificationKind, OrderId, UserId};

use super::RepositoryError;
use crate::models::Notification;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, read, read_at, link, order_id, priority, created_at";

/// Parameters for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub order_id: Option<OrderId>,
    /// 1 (lowest) through 5 (highest).
    pub priority: i16,
}

/// Repository for notification operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new unread notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        params: &CreateNotification,
    ) -> Result<Notification, RepositoryError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO shop.notifications
                 (user_id, title, message, kind, link, order_id, priority)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(params.user_id)
        .bind(&params.title)
        .bind(&params.message)
        .bind(params.kind)
        .bind(&params.link)
        .bind(params.order_id)
        .bind(params.priority.clamp(1, 5))
        .fetch_one(self.pool)
        .await?;

        Ok(notification)
    }

    /// List a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let items = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM shop.notifications
             WHERE user_id = $1 AND ($2 = FALSE OR read = FALSE)
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Flip one notification to read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the notification doesn't
    /// exist or belongs to another user.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.notifications
             SET read = TRUE, read_at = NOW()
             WHERE id = $1 AND user_id = $2 AND read = FALSE",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Flip all of a user's notifications to read. Returns the count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.notifications
             SET read = TRUE, read_at = NOW()
             WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
