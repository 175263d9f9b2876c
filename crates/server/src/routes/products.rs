//! Catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use copperleaf_core::{CategoryId, Price, ProductId};

use crate::db::{
    ProductRepository,
    products::{ProductFilter, ProductInput, VariantInput},
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, Variant};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct VariantBody {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct ProductBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub mrp: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub variants: Vec<VariantBody>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

fn to_input(body: ProductBody) -> Result<ProductInput> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_owned()));
    }
    let price = Price::new(body.price, body.mrp)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if body.stock < 0 || body.variants.iter().any(|v| v.stock < 0) {
        return Err(AppError::Validation("Stock cannot be negative".to_owned()));
    }

    Ok(ProductInput {
        name: body.name.trim().to_owned(),
        description: body.description,
        image_url: body.image_url,
        category_id: body.category_id,
        price: price.amount,
        mrp: price.mrp,
        stock: body.stock,
        variants: body
            .variants
            .into_iter()
            .map(|v| VariantInput {
                size: v.size,
                color: v.color,
                stock: v.stock,
            })
            .collect(),
    })
}

/// `GET /api/products`
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductRepository::new(&state.pool)
        .list(&ProductFilter {
            category_id: query.category_id,
            search: query.search,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(Json(ApiResponse::ok("Products", products)))
}

/// `GET /api/products/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let repo = ProductRepository::new(&state.pool);
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    let variants = repo.variants(id).await?;

    Ok(Json(ApiResponse::ok(
        "Product",
        ProductDetail { product, variants },
    )))
}

/// `POST /api/products` (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<ProductBody>,
) -> Result<Json<ApiResponse<Product>>> {
    let input = to_input(body)?;
    let product = ProductRepository::new(&state.pool).create(&input).await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok(Json(ApiResponse::ok("Product created", product)))
}

/// `PUT /api/products/{id}` (admin)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductBody>,
) -> Result<Json<ApiResponse<Product>>> {
    let input = to_input(body)?;
    let product = ProductRepository::new(&state.pool).update(id, &input).await?;

    Ok(Json(ApiResponse::ok("Product updated", product)))
}

/// `DELETE /api/products/{id}` (admin)
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<()>>> {
    ProductRepository::new(&state.pool).delete(id).await?;
    Ok(Json(ApiResponse::message("Product deleted")))
}
