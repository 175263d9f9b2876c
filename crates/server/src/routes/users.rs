//! Account registration, verification, login, and profile handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use copperleaf_core::Email;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::User;
use crate::response::ApiResponse;
use crate::services::auth::{
    generate_verification_code, hash_password, issue_token, verify_password,
};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/users/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<ApiResponse<User>>> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_owned()));
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(&body.password)?;
    let code = generate_verification_code();

    let user = UserRepository::new(&state.pool)
        .create(email.as_str(), body.name.trim(), &password_hash, &code)
        .await?;

    if let Some(mailer) = state.email.clone() {
        let to = email.into_inner();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification_code(&to, &code).await {
                tracing::warn!(error = %e, "Verification email failed");
            }
        });
    }

    tracing::info!(user_id = %user.id, "Account registered");
    Ok(Json(ApiResponse::ok(
        "Account created. Check your email for the verification code.",
        user,
    )))
}

/// `POST /api/users/verify`
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<ApiResponse<()>>> {
    let repo = UserRepository::new(&state.pool);
    let user = repo
        .get_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_owned()))?;

    repo.verify(user.id, body.code.trim()).await?;

    Ok(Json(ApiResponse::message("Account verified")))
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let (user, stored_hash) = UserRepository::new(&state.pool)
        .get_auth_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_owned()))?;

    verify_password(&body.password, &stored_hash)?;

    if user.is_blocked {
        return Err(AppError::Authorization("Account is blocked".to_owned()));
    }

    let token = issue_token(&state.config, user.id, user.role)?;

    Ok(Json(ApiResponse::ok(
        "Logged in",
        LoginResponse { token, user },
    )))
}

/// `GET /api/users/profile`
pub async fn profile(RequireUser(user): RequireUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok("Profile", user))
}

/// `PUT /api/users/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<ApiResponse<User>>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_owned()));
    }

    let repo = UserRepository::new(&state.pool);
    repo.update_name(user.id, body.name.trim()).await?;
    let updated = repo
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_owned()))?;

    Ok(Json(ApiResponse::ok("Profile updated", updated)))
}
