//! User repository for database operations.

use sqlx::PgPool;

use copperleaf_core::UserId;

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str =
    "id, email, name, role, is_verified, is_blocked, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_auth_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AuthRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a new account. The account starts unverified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        verification_code: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO shop.users (email, name, password_hash, verification_code)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(verification_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("An account with this email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(user)
    }

    /// Mark a user verified when the supplied code matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code does not match an
    /// unverified account, and `RepositoryError::Database` for query errors.
    pub async fn verify(&self, id: UserId, code: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.users
             SET is_verified = TRUE, verification_code = NULL
             WHERE id = $1 AND verification_code = $2 AND NOT is_verified",
        )
        .bind(id)
        .bind(code)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "Invalid or already-used verification code".to_owned(),
            ));
        }

        Ok(())
    }

    /// Update the display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.users SET name = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(name)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Set or clear the blocked flag (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_blocked(&self, id: UserId, blocked: bool) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.users SET is_blocked = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(blocked)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AuthRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}
