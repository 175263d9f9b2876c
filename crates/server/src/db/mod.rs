//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `users` - Accounts, roles, verification and block flags
//! - `categories` - Product categories
//! - `products` / `product_variants` - Catalog and stock
//! - `orders` / `order_items` - Live orders with line snapshots
//! - `cancelled_orders` - Append-only archive of terminated orders
//! - `order_idempotency_keys` - Client-supplied checkout replay guard
//! - `cart_items` - Per-user cart lines (totals derived, never stored)
//! - `wishlist_items` - Per-user wishlist lines
//! - `notifications` - Per-user inbox records
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p copperleaf-cli -- migrate
//! ```
//! They are never applied automatically at startup.
//!
//! All queries are runtime-checked (`query`/`query_as` with `FromRow`), so
//! the workspace builds without a live database.

pub mod cancelled_orders;
pub mod carts;
pub mod categories;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use notifications::NotificationRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("{0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
