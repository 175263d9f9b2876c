//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copperleaf_core::{UserId, UserRole};

/// A storefront account.
///
/// The password hash never leaves the db layer; this type is safe to
/// serialize into API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Email address (unique).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role gate for admin endpoints.
    pub role: UserRole,
    /// Whether the email verification code has been confirmed.
    /// Unverified accounts cannot place orders.
    pub is_verified: bool,
    /// Blocked accounts are rejected at the auth boundary.
    pub is_blocked: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
