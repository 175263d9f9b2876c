//! Authentication extractors.
//!
//! Both extractors parse the `Authorization: Bearer <jwt>` header, decode
//! the claims, and load the account so handlers always see a live user
//! row. Blocked accounts are rejected here regardless of token validity.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     RequireUser(user): RequireUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", user.name)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use copperleaf_core::UserRole;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth::decode_token;
use crate::state::AppState;

/// Extractor requiring a valid, unblocked account.
pub struct RequireUser(pub User);

/// Extractor requiring an admin account.
pub struct RequireAdmin(pub User);

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing authorization header".to_owned()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Expected a bearer token".to_owned()))?;

    let claims = decode_token(&state.config, token)?;

    let user = UserRepository::new(&state.pool)
        .get_by_id(claims.user_id())
        .await?
        .ok_or_else(|| AppError::Authentication("Account no longer exists".to_owned()))?;

    if user.is_blocked {
        return Err(AppError::Authorization("Account is blocked".to_owned()));
    }

    Ok(user)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::Authorization("Admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}
