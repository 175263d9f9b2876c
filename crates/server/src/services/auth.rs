//! Token issuing/verification and password hashing.
//!
//! Bearer tokens are HS256 JWTs carrying the user id and role; passwords
//! are hashed with Argon2id.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use jsonwebtoken::errors::ErrorKind;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use copperleaf_core::{UserId, UserRole};

use crate::config::ServerConfig;

/// Claims stored in the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject).
    pub sub: i32,
    /// Role gate for admin endpoints.
    pub role: UserRole,
    /// Expiry timestamp (seconds).
    pub exp: i64,
    /// Issued-at timestamp (seconds).
    pub iat: i64,
}

impl Claims {
    /// The user this token belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token expired.
    #[error("token expired")]
    TokenExpired,

    /// Token malformed or signature mismatch.
    #[error("invalid token")]
    TokenInvalid,

    /// Password hashing failed.
    #[error("hashing error: {0}")]
    Hashing(String),
}

/// Hash a password with Argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch and
/// `AuthError::Hashing` when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Issue a signed token for a user.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if signing fails.
pub fn issue_token(
    config: &ServerConfig,
    user_id: UserId,
    role: UserRole,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_i32(),
        role,
        exp: (now + Duration::minutes(config.jwt_expiry_minutes)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Decode and validate a bearer token.
///
/// # Errors
///
/// Returns `AuthError::TokenExpired` past expiry and
/// `AuthError::TokenInvalid` for any other decode failure.
pub fn decode_token(config: &ServerConfig, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://test"),
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            jwt_secret: SecretString::from("k9P2mQ7vX4wL8nR3tZ6bJ1cF5hD0gA9s"),
            jwt_expiry_minutes: 60,
            admin_email: copperleaf_core::Email::parse("ops@copperleaf.shop").expect("valid"),
            email: None,
        }
    }

    #[test]
    fn token_round_trips() {
        let config = test_config();
        let token =
            issue_token(&config, UserId::new(7), UserRole::Admin).expect("token issued");
        let claims = decode_token(&config, &token).expect("token decoded");
        assert_eq!(claims.user_id(), UserId::new(7));
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, UserId::new(1), UserRole::User).expect("token issued");
        let tampered = format!("{token}x");
        assert!(matches!(
            decode_token(&config, &tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery staple").expect("hashed");
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn verification_code_is_six_digits() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
