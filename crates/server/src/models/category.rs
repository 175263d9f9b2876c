//! Category domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copperleaf_core::CategoryId;

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}
