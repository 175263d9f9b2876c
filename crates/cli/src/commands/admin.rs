//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! copperleaf-cli admin create -e admin@example.com -n "Admin Name" -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `COPPERLEAF_DATABASE_URL` - `PostgreSQL` connection string

use thiserror::Error;

use copperleaf_core::Email;

use super::connect;

/// Errors that can occur during admin account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least 8 characters")]
    WeakPassword,

    /// Account already exists.
    #[error("{0}")]
    Exists(String),

    /// Hashing failure.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Create a new admin account. The account is created verified, with the
/// admin role already set.
///
/// # Errors
///
/// Returns `AdminError` for invalid input or database failures.
pub async fn create_admin(email: &str, name: &str, password: &str) -> Result<(), AdminError> {
    let email =
        Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    if password.len() < 8 {
        return Err(AdminError::WeakPassword);
    }

    let pool = connect()
        .await
        .map_err(|e| AdminError::Database(e.to_string()))?;

    let password_hash = copperleaf_server::services::auth::hash_password(password)
        .map_err(|e| AdminError::Hashing(e.to_string()))?;

    tracing::info!("Creating admin account: {}", email);

    let result = sqlx::query(
        "INSERT INTO shop.users (email, name, password_hash, role, is_verified)
         VALUES ($1, $2, $3, 'admin', TRUE)",
    )
    .bind(email.as_str())
    .bind(name)
    .bind(&password_hash)
    .execute(&pool)
    .await;

    match result {
        Ok(_) => {
            tracing::info!("Admin account created");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            AdminError::Exists(format!("An account already exists for {email}")),
        ),
        Err(e) => Err(AdminError::Database(e.to_string())),
    }
}
