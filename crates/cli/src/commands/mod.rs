//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect with `COPPERLEAF_DATABASE_URL` from the environment.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("COPPERLEAF_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "COPPERLEAF_DATABASE_URL not set")?;

    let pool = copperleaf_server::db::create_pool(&database_url).await?;
    Ok(pool)
}
