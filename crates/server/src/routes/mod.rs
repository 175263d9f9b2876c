//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the database)
//!
//! # Users
//! POST /api/users/register              - Create account (emails verification code)
//! POST /api/users/verify                - Confirm verification code
//! POST /api/users/login                 - Exchange credentials for a JWT
//! GET  /api/users/profile               - Current account
//! PUT  /api/users/profile               - Update display name
//!
//! # Products
//! GET  /api/products                    - Listing (category/search/pagination)
//! GET  /api/products/{id}               - Detail with variants
//! POST /api/products                    - Create (admin)
//! PUT  /api/products/{id}               - Update (admin)
//! DELETE /api/products/{id}             - Delete (admin)
//!
//! # Categories
//! GET  /api/categories                  - Listing
//! POST /api/categories                  - Create (admin)
//! DELETE /api/categories/{id}           - Delete (admin)
//!
//! # Cart
//! GET  /api/cart                        - Lines with derived totals
//! POST /api/cart                        - Add line (snapshots price at add)
//! PUT  /api/cart                        - Set line quantity
//! POST /api/cart/remove                 - Remove line (composite key in body)
//! DELETE /api/cart                      - Clear
//!
//! # Wishlist
//! GET  /api/wishlist                    - Listing
//! POST /api/wishlist                    - Add product
//! DELETE /api/wishlist/{productId}      - Remove product
//! POST /api/wishlist/move-to-cart       - Move a product into the cart
//!
//! # Orders
//! POST /api/orders                      - Checkout
//! GET  /api/orders                      - Own orders
//! GET  /api/orders/all                  - All live orders (admin)
//! GET  /api/orders/cancelled            - Archive (admin)
//! GET  /api/orders/{id}                 - Detail (owner or admin)
//! DELETE /api/orders/{id}               - User cancel (Pending only)
//! POST /api/orders/request-cancel/{id}  - Request cancellation (Processing only)
//! PUT  /api/orders/{id}                 - Status update / request review (admin)
//!
//! # Admin
//! PUT  /api/admin/orders/bulk-update    - Bulk status move, per-id outcomes
//! PUT  /api/admin/orders/bulk-cancel    - Bulk cancel, per-id outcomes
//! DELETE /api/admin/orders/cancelled    - Bulk delete archive rows
//! PUT  /api/admin/users/{id}/block      - Block or unblock an account
//!
//! # Notifications
//! GET  /api/notifications               - Own inbox (?unread_only=true)
//! PUT  /api/notifications/{id}/read     - Mark one read
//! PUT  /api/notifications/read-all      - Mark all read
//! ```

pub mod admin;
pub mod cart;
pub mod categories;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the user/auth routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/verify", post(users::verify))
        .route("/login", post(users::login))
        .route("/profile", get(users::profile).put(users::update_profile))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{id}", delete(categories::remove))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show)
                .post(cart::add)
                .put(cart::update_quantity)
                .delete(cart::clear),
        )
        .route("/remove", post(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::add))
        .route("/{product_id}", delete(wishlist::remove))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the order routes router.
///
/// `/all` and `/cancelled` are registered before `/{id}` so the literal
/// segments win.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place).get(orders::index))
        .route("/all", get(orders::all))
        .route("/cancelled", get(orders::cancelled))
        .route("/request-cancel/{id}", post(orders::request_cancel))
        .route(
            "/{id}",
            get(orders::show)
                .delete(orders::cancel)
                .put(orders::update_status),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/bulk-update", put(admin::bulk_update))
        .route("/orders/bulk-cancel", put(admin::bulk_cancel))
        .route("/orders/cancelled", delete(admin::delete_cancelled))
        .route("/users/{id}/block", put(admin::set_blocked))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/{id}/read", put(notifications::mark_read))
        .route("/read-all", put(notifications::mark_all_read))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/notifications", notification_routes())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::PgPool;
    use tower::ServiceExt;

    use copperleaf_core::Email;

    use crate::config::ServerConfig;
    use crate::state::build_state;

    use super::routes;

    fn test_router() -> axum::Router {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://copperleaf@localhost/copperleaf_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_owned(),
            jwt_secret: SecretString::from("k9P2mQ7vX4wL8nR3tZ6bJ1cF5hD0gA9s"),
            jwt_expiry_minutes: 60,
            admin_email: Email::parse("ops@copperleaf.test").unwrap(),
            email: None,
        };
        let pool = PgPool::connect_lazy("postgres://copperleaf@localhost/copperleaf_test")
            .unwrap();
        routes().with_state(build_state(config, pool, None))
    }

    async fn dispatch(method: Method, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        test_router().oneshot(request).await.unwrap().status()
    }

    // The auth extractor runs before any handler touches the database, so
    // a 401 (rather than 405) shows the method/path pair is registered.
    #[tokio::test]
    async fn bulk_admin_operations_are_routed_as_put() {
        for uri in ["/api/admin/orders/bulk-update", "/api/admin/orders/bulk-cancel"] {
            assert_eq!(
                dispatch(Method::PUT, uri).await,
                StatusCode::UNAUTHORIZED,
                "{uri} should accept PUT",
            );
        }
    }

    #[tokio::test]
    async fn unknown_admin_paths_are_not_routed() {
        assert_eq!(
            dispatch(Method::PUT, "/api/admin/orders/bulk-archive").await,
            StatusCode::NOT_FOUND,
        );
    }
}
