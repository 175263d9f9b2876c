//! Service layer: authentication, outbound email, and the order
//! lifecycle workflow.

pub mod auth;
pub mod email;
pub mod orders;

pub use email::EmailService;
pub use orders::OrderService;
