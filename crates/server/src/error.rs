//! Unified error handling.
//!
//! Provides a unified `AppError` type mapped onto the response envelope.
//! All route handlers return `Result<T, AppError>`; business-rule failures
//! surface their message verbatim while internal errors are hidden from
//! clients and logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::response::ApiResponse;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed (unexpected).
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Resource absent.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid token.
    #[error("{0}")]
    Authentication(String),

    /// Role or ownership mismatch.
    #[error("{0}")]
    Authorization(String),

    /// Business-rule failure: duplicate order, stock shortfall, invalid
    /// state transition.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::from(RepositoryError::from(err))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Authentication("Invalid email or password".to_owned())
            }
            AuthError::TokenExpired => Self::Authentication("Token expired".to_owned()),
            AuthError::TokenInvalid => Self::Authentication("Invalid token".to_owned()),
            AuthError::Hashing(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(
            status_of(AppError::Validation("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::NotFound("gone".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Authentication("no token".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Authorization("not yours".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Conflict("Out of Stock: 3 left".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn repository_not_found_becomes_404() {
        let err: AppError = RepositoryError::NotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn business_messages_surface_verbatim() {
        let err = AppError::Conflict("Cannot cancel an order that is already processed".to_owned());
        assert_eq!(
            err.to_string(),
            "Cannot cancel an order that is already processed"
        );
    }
}
