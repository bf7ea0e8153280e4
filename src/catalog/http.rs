//! Catalog Store over its JSON HTTP API.

use super::{CatalogError, CatalogResult, CatalogStore};
use crate::types::{Category, DetailId, Price, Product, ProductDetail, ProductId, Rating};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Catalog client for the storefront's REST endpoints.
///
/// Per-call timeouts are applied by [`super::CatalogAccessor`]; the client timeout here is
/// only a backstop for stuck connections.
#[derive(Debug, Clone)]
pub struct HttpCatalogStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogStore {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout.saturating_mul(2))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> CatalogResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::trace!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::Decode(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl CatalogStore for HttpCatalogStore {
    async fn categories(&self) -> CatalogResult<Vec<Category>> {
        self.get("/categories").await
    }

    async fn products(&self) -> CatalogResult<Vec<Product>> {
        self.get("/products").await
    }

    async fn details_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<ProductDetail>> {
        self.get(&format!("/products/{product_id}/details")).await
    }

    async fn prices(&self) -> CatalogResult<Vec<Price>> {
        self.get("/prices").await
    }

    async fn prices_for_detail(&self, detail_id: DetailId) -> CatalogResult<Vec<Price>> {
        self.get(&format!("/prices/product-detail/{detail_id}")).await
    }

    async fn ratings_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<Rating>> {
        self.get(&format!("/ratings/product/{product_id}")).await
    }
}
