//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COPPERLEAF_DATABASE_URL` - `PostgreSQL` connection string
//! - `COPPERLEAF_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `COPPERLEAF_ADMIN_EMAIL` - Address that receives order/stock alerts
//!
//! ## Optional
//! - `COPPERLEAF_HOST` - Bind address (default: 127.0.0.1)
//! - `COPPERLEAF_PORT` - Listen port (default: 3000)
//! - `COPPERLEAF_BASE_URL` - Public URL used in email links (default: `http://localhost:3000`)
//! - `COPPERLEAF_JWT_EXPIRY_MINUTES` - Token lifetime (default: 1440)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` -
//!   outbound email; when `SMTP_HOST` is unset the server runs without email

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use copperleaf_core::Email;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Substrings that mark a secret as a placeholder rather than a real key.
/// Matched case-insensitively.
const WEAK_SECRET_MARKERS: &[&str] = &[
    "changeme",
    "password",
    "secret",
    "example",
    "placeholder",
    "your-",
    "insert",
    "dummy",
    "todo",
    "fixme",
    "xxx",
];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {0} has an invalid value: {1}")]
    Invalid(&'static str, String),
    #[error("{0} is not a usable secret: {1}")]
    WeakSecret(&'static str, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for links inside emails
    pub base_url: String,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Token lifetime in minutes
    pub jwt_expiry_minutes: i64,
    /// Address that receives order and low-stock alerts
    pub admin_email: Email,
    /// Outbound email configuration; `None` disables email entirely
    pub email: Option<EmailConfig>,
}

/// SMTP configuration for outbound email.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP port (default: 587)
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// From address for all outbound mail
    pub from_address: String,
}

// The password is left out of Debug output entirely.
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value
    /// fails to parse, or the JWT secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(require_env("COPPERLEAF_DATABASE_URL")?);

        let host: IpAddr = optional_env("COPPERLEAF_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid("COPPERLEAF_HOST", format!("{e}")))?;

        let port: u16 = optional_env("COPPERLEAF_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid("COPPERLEAF_PORT", format!("{e}")))?;

        let base_url = optional_env("COPPERLEAF_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_owned());

        let jwt_secret = require_env("COPPERLEAF_JWT_SECRET")?;
        validate_secret("COPPERLEAF_JWT_SECRET", &jwt_secret)?;

        let jwt_expiry_minutes: i64 = optional_env("COPPERLEAF_JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|| "1440".to_owned())
            .parse()
            .map_err(|e| ConfigError::Invalid("COPPERLEAF_JWT_EXPIRY_MINUTES", format!("{e}")))?;

        let admin_email_raw = require_env("COPPERLEAF_ADMIN_EMAIL")?;
        let admin_email = Email::parse(&admin_email_raw)
            .map_err(|e| ConfigError::Invalid("COPPERLEAF_ADMIN_EMAIL", format!("{e}")))?;

        let email = load_email_config()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_expiry_minutes,
            admin_email,
            email,
        })
    }

    /// Socket address to bind the HTTP listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn load_email_config() -> Result<Option<EmailConfig>, ConfigError> {
    let Some(smtp_host) = optional_env("SMTP_HOST") else {
        return Ok(None);
    };

    let smtp_port: u16 = optional_env("SMTP_PORT")
        .unwrap_or_else(|| "587".to_owned())
        .parse()
        .map_err(|e| ConfigError::Invalid("SMTP_PORT", format!("{e}")))?;

    Ok(Some(EmailConfig {
        smtp_host,
        smtp_port,
        smtp_username: require_env("SMTP_USERNAME")?,
        smtp_password: SecretString::from(require_env("SMTP_PASSWORD")?),
        from_address: require_env("SMTP_FROM")?,
    }))
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Reject short or obviously-placeholder secrets.
fn validate_secret(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::WeakSecret(
            name,
            format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    for marker in WEAK_SECRET_MARKERS {
        if lowered.contains(marker) {
            return Err(ConfigError::WeakSecret(
                name,
                format!("contains placeholder text '{marker}'"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_is_rejected() {
        let err = validate_secret("TEST", "short").unwrap_err();
        assert!(matches!(err, ConfigError::WeakSecret(_, _)));
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let err =
            validate_secret("TEST", "changeme-changeme-changeme-changeme-long").unwrap_err();
        assert!(matches!(err, ConfigError::WeakSecret(_, _)));
    }

    #[test]
    fn strong_secret_is_accepted() {
        assert!(validate_secret("TEST", "k9P2mQ7vX4wL8nR3tZ6bJ1cF5hD0gA9s").is_ok());
    }
}
