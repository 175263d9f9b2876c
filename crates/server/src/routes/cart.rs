//! Cart handlers.
//!
//! Lines are addressed by the (product, size, color) composite key; totals
//! are derived on every read.

use axum::{Json, extract::State};
use serde::Deserialize;

use copperleaf_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{CartItem, CartView};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddBody {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

/// `GET /api/cart`
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<CartView>>> {
    let items = CartRepository::new(&state.pool).items(user.id).await?;
    Ok(Json(ApiResponse::ok("Cart", CartView::new(items))))
}

/// `POST /api/cart`
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddBody>,
) -> Result<Json<ApiResponse<CartItem>>> {
    if body.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".to_owned()));
    }

    let product = ProductRepository::new(&state.pool)
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let item = CartRepository::new(&state.pool)
        .add_item(user.id, &product, &body.size, &body.color, body.quantity)
        .await?;

    Ok(Json(ApiResponse::ok("Added to cart", item)))
}

/// `PUT /api/cart`
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<QuantityBody>,
) -> Result<Json<ApiResponse<CartView>>> {
    if body.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".to_owned()));
    }

    let repo = CartRepository::new(&state.pool);
    repo.set_quantity(user.id, body.product_id, &body.size, &body.color, body.quantity)
        .await?;

    let items = repo.items(user.id).await?;
    Ok(Json(ApiResponse::ok("Cart updated", CartView::new(items))))
}

/// `POST /api/cart/remove`
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<RemoveBody>,
) -> Result<Json<ApiResponse<CartView>>> {
    let repo = CartRepository::new(&state.pool);
    repo.remove_item(user.id, body.product_id, &body.size, &body.color)
        .await?;

    let items = repo.items(user.id).await?;
    Ok(Json(ApiResponse::ok(
        "Removed from cart",
        CartView::new(items),
    )))
}

/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<()>>> {
    CartRepository::new(&state.pool).clear(user.id).await?;
    Ok(Json(ApiResponse::message("Cart cleared")))
}
