//! Category handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use copperleaf_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

/// `GET /api/categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = CategoryRepository::new(&state.pool).list().await?;
    Ok(Json(ApiResponse::ok("Categories", categories)))
}

/// `POST /api/categories` (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CategoryBody>,
) -> Result<Json<ApiResponse<Category>>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".to_owned()));
    }

    let name = body.name.trim();
    let category = CategoryRepository::new(&state.pool)
        .create(name, &slugify(name))
        .await?;

    Ok(Json(ApiResponse::ok("Category created", category)))
}

/// Lowercased name with non-alphanumeric runs collapsed to hyphens.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_owned()
}

/// `DELETE /api/categories/{id}` (admin)
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<()>>> {
    CategoryRepository::new(&state.pool).delete(id).await?;
    Ok(Json(ApiResponse::message("Category deleted")))
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Summer Wear"), "summer-wear");
        assert_eq!(slugify("  Kids & Toys  "), "kids-toys");
        assert_eq!(slugify("SALE!"), "sale");
    }
}
