//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{EmailService, OrderService};

/// Shared state handed to every handler.
pub type AppState = Arc<AppStateInner>;

/// Inner application state.
pub struct AppStateInner {
    pub config: ServerConfig,
    pub pool: PgPool,
    /// Absent when SMTP is not configured; email side effects are skipped.
    pub email: Option<EmailService>,
    pub orders: OrderService,
}

/// Build the shared state, wiring the order service to the pool and the
/// optional mailer.
#[must_use]
pub fn build_state(config: ServerConfig, pool: PgPool, email: Option<EmailService>) -> AppState {
    let orders = OrderService::new(
        pool.clone(),
        email.clone(),
        config.admin_email.as_str().to_owned(),
    );

    Arc::new(AppStateInner {
        config,
        pool,
        email,
        orders,
    })
}
