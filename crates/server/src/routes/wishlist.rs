//! Wishlist handlers.
//!
//! Wishlist entries carry no price snapshot; move-to-cart reads the live
//! product price at that moment.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use copperleaf_core::ProductId;

use crate::db::{CartRepository, ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{CartItem, WishlistItem};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// `GET /api/wishlist`
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<WishlistItem>>>> {
    let items = WishlistRepository::new(&state.pool).items(user.id).await?;
    Ok(Json(ApiResponse::ok("Wishlist", items)))
}

/// `POST /api/wishlist`
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddBody>,
) -> Result<Json<ApiResponse<()>>> {
    ProductRepository::new(&state.pool)
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    WishlistRepository::new(&state.pool)
        .add_item(user.id, body.product_id, &body.size, &body.color)
        .await?;

    Ok(Json(ApiResponse::message("Added to wishlist")))
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    pub size: Option<String>,
    pub color: Option<String>,
}

/// What a wishlist delete should remove.
#[derive(Debug, PartialEq, Eq)]
enum RemoveScope {
    /// No dimensions given: every entry for the product.
    Product,
    /// Exactly one (size, color) entry.
    Entry { size: String, color: String },
}

impl RemoveScope {
    fn from_query(query: RemoveQuery) -> Self {
        match (query.size, query.color) {
            (None, None) => Self::Product,
            (size, color) => Self::Entry {
                size: size.unwrap_or_default(),
                color: color.unwrap_or_default(),
            },
        }
    }
}

/// `DELETE /api/wishlist/{product_id}`
///
/// Without query parameters every entry for the product is removed;
/// `?size=` and `?color=` narrow the delete to one (size, color) line.
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<ApiResponse<()>>> {
    let repo = WishlistRepository::new(&state.pool);
    match RemoveScope::from_query(query) {
        RemoveScope::Product => repo.remove_product(user.id, product_id).await?,
        RemoveScope::Entry { size, color } => {
            repo.remove_item(user.id, product_id, &size, &color).await?;
        }
    }

    Ok(Json(ApiResponse::message("Removed from wishlist")))
}

/// `POST /api/wishlist/move-to-cart`
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<MoveBody>,
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

    // Best effort: a wishlist entry under a different (size, color) is
    // left in place.
    if let Err(e) = WishlistRepository::new(&state.pool)
        .remove_item(user.id, body.product_id, &body.size, &body.color)
        .await
    {
        tracing::debug!(product_id = %body.product_id, error = %e, "Wishlist entry not removed");
    }

    Ok(Json(ApiResponse::ok("Moved to cart", item)))
}

#[cfg(test)]
mod tests {
    use super::{RemoveQuery, RemoveScope};

    #[test]
    fn bare_delete_covers_every_dimension_of_the_product() {
        let scope = RemoveScope::from_query(RemoveQuery {
            size: None,
            color: None,
        });
        assert_eq!(scope, RemoveScope::Product);
    }

    #[test]
    fn dimension_params_narrow_the_delete_to_one_entry() {
        let scope = RemoveScope::from_query(RemoveQuery {
            size: Some("M".to_owned()),
            color: Some("Blue".to_owned()),
        });
        assert_eq!(
            scope,
            RemoveScope::Entry {
                size: "M".to_owned(),
                color: "Blue".to_owned(),
            }
        );

        // A single given dimension still targets one entry, the other
        // dimension defaulting to the empty key.
        let scope = RemoveScope::from_query(RemoveQuery {
            size: Some("M".to_owned()),
            color: None,
        });
        assert_eq!(
            scope,
            RemoveScope::Entry {
                size: "M".to_owned(),
                color: String::new(),
            }
        );
    }
}
