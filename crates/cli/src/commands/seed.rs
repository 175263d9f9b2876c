//! Seed the catalog from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! copperleaf-cli seed -f seed/catalog.yaml
//! ```
//!
//! # File format
//!
//! ```yaml
//! categories:
//!   - Shirts
//!   - Trousers
//! products:
//!   - name: Linen Shirt
//!     description: Breathable summer shirt
//!     category: Shirts
//!     price: "49.99"
//!     mrp: "59.99"
//!     stock: 40
//!     variants:
//!       - { size: M, color: white, stock: 20 }
//!       - { size: L, color: white, stock: 20 }
//! ```

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use copperleaf_core::CategoryId;
use copperleaf_server::db::{
    CategoryRepository, ProductRepository,
    products::{ProductInput, VariantInput},
};

use super::connect;

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    price: Decimal,
    mrp: Decimal,
    #[serde(default)]
    stock: i32,
    #[serde(default)]
    variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
struct SeedVariant {
    #[serde(default)]
    size: String,
    #[serde(default)]
    color: String,
    stock: i32,
}

/// Seed categories and products.
///
/// Categories that already exist are reused; products are always inserted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let pool = connect().await?;

    let category_repo = CategoryRepository::new(&pool);
    let mut category_ids: HashMap<String, CategoryId> = category_repo
        .list()
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();

    for name in &seed.categories {
        if category_ids.contains_key(name) {
            continue;
        }
        let slug = name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        let category = category_repo.create(name, &slug).await?;
        category_ids.insert(category.name.clone(), category.id);
        info!(category = %name, "Category created");
    }

    let product_repo = ProductRepository::new(&pool);
    for product in seed.products {
        let category_id = product
            .category
            .as_ref()
            .and_then(|name| category_ids.get(name))
            .copied();

        let created = product_repo
            .create(&ProductInput {
                name: product.name.clone(),
                description: product.description,
                image_url: product.image_url,
                category_id,
                price: product.price,
                mrp: product.mrp,
                stock: product.stock,
                variants: product
                    .variants
                    .into_iter()
                    .map(|v| VariantInput {
                        size: v.size,
                        color: v.color,
                        stock: v.stock,
                    })
                    .collect(),
            })
            .await?;

        info!(product_id = %created.id, name = %created.name, "Product created");
    }

    info!("Seeding complete");
    Ok(())
}
