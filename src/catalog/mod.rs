//! Catalog Store access: the remote contract, its adapters, and the fault-tolerant accessor.

pub mod accessor;
pub mod http;
pub mod memory;

pub use accessor::{CatalogAccessor, PriceTable};
pub use http::HttpCatalogStore;
pub use memory::MemoryCatalog;

use crate::types::{Category, DetailId, Price, Product, ProductDetail, ProductId, Rating};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Error returned by a single Catalog Store call.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
    #[error("catalog transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("failed to decode catalog payload: {0}")]
    Decode(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Read-only operations the engine needs from the Catalog Store.
///
/// Implementations report every failure; the accessor decides which ones are fatal.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn categories(&self) -> CatalogResult<Vec<Category>>;

    async fn products(&self) -> CatalogResult<Vec<Product>>;

    async fn details_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<ProductDetail>>;

    async fn prices(&self) -> CatalogResult<Vec<Price>>;

    async fn prices_for_detail(&self, detail_id: DetailId) -> CatalogResult<Vec<Price>>;

    async fn ratings_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<Rating>>;
}
