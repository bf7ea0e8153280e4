//! In-process catalog snapshot, loadable from a JSON file.

use super::{CatalogResult, CatalogStore};
use crate::error::Result;
use crate::types::{Category, DetailId, Price, Product, ProductDetail, ProductId, Rating};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete catalog held in memory.
///
/// The JSON form has one array per entity: `categories`, `products`, `details`, `prices`,
/// `ratings`. Missing arrays are empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryCatalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub details: Vec<ProductDetail>,
    pub prices: Vec<Price>,
    pub ratings: Vec<Rating>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog snapshot {}", path.display()))?;
        let catalog: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog snapshot {}", path.display()))?;
        tracing::info!(
            "Loaded catalog snapshot: {} products, {} details, {} prices",
            catalog.products.len(),
            catalog.details.len(),
            catalog.prices.len()
        );
        Ok(catalog)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn categories(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn products(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn details_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<ProductDetail>> {
        Ok(self
            .details
            .iter()
            .filter(|detail| detail.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn prices(&self) -> CatalogResult<Vec<Price>> {
        Ok(self.prices.clone())
    }

    async fn prices_for_detail(&self, detail_id: DetailId) -> CatalogResult<Vec<Price>> {
        Ok(self
            .prices
            .iter()
            .filter(|price| price.product_detail_id == detail_id)
            .cloned()
            .collect())
    }

    async fn ratings_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<Rating>> {
        Ok(self
            .ratings
            .iter()
            .filter(|rating| rating.product_id == product_id)
            .cloned()
            .collect())
    }
}
