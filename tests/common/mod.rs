//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `catalog`: a small candle and essential-oil shop with categories, variants, prices and ratings
//!
//! # Collaborator doubles
//!
//! - [`ScriptedClassifier`] returns a fixed intent (or fails) regardless of the utterance
//! - [`UnreachableResponder`] fails every chat reply
//! - [`FaultyCatalog`] wraps a [`MemoryCatalog`] and fails selected calls

#![allow(dead_code)] // Helpers used across different integration test crates

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rstest::fixture;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use storefront_search::assistant::{
    AssistantError, AssistantResult, CannedResponder, ChatResponder, IntentClassifier,
};
use storefront_search::catalog::{CatalogError, CatalogResult};
use storefront_search::search::AssemblyOptions;
use storefront_search::types::{
    Category, DetailId, Image, Price, Product, ProductDetail, ProductId, Rating, SearchIntent,
};
use storefront_search::{CatalogAccessor, CatalogStore, MemoryCatalog, SearchEngine};

pub const CHAT_REPLY: &str = "Chào bạn, shop có thể giúp gì?";

fn category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        description: String::new(),
    }
}

fn product(id: ProductId, category_id: i64, name: &str, description: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: description.to_string(),
        category_id,
        images: vec![Image {
            id,
            url: format!("https://cdn.example/p{id}.jpg"),
        }],
    }
}

fn detail(id: DetailId, product_id: ProductId, size: &str, scent: &str) -> ProductDetail {
    ProductDetail {
        id,
        product_id,
        size: size.to_string(),
        kind: "scent".to_string(),
        values: scent.to_string(),
        quantities: 20,
        is_active: true,
        images: vec![],
    }
}

fn price(detail_id: DetailId, base: i64, discount: i64) -> Price {
    Price {
        id: detail_id * 10,
        product_detail_id: detail_id,
        base_price: Decimal::from(base),
        discount_percent: Decimal::from(discount),
        start_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        end_date: None,
    }
}

fn ratings(product_id: ProductId, values: &[f64]) -> Vec<Rating> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| Rating {
            id: product_id * 100 + i as i64,
            product_id,
            rating: *value,
        })
        .collect()
}

/// Five products across three categories.
///
/// | id | name                      | category | details (size, scent, final price)        | ratings   |
/// |----|---------------------------|----------|-------------------------------------------|-----------|
/// | 1  | Nến thơm Lavender Thyme   | 1        | 200g Oải hương 80.000                      | 5, 4      |
/// | 2  | Nến thơm Cam Quế          | 1        | 200g Cam Bergamot 150.000; 100g Quế 120.000 | 4         |
/// | 3  | Tinh dầu Sả Chanh         | 2        | 10ml Sả chanh 85.500 (10% off)             | 5, 5, 4   |
/// | 4  | Tinh dầu Bạc Hà           | 2        | 10ml Bạc hà 150.000                        | 4, 5      |
/// | 5  | Sáp thơm Vani             | 3        | 100g Vani 60.000                           | 3         |
#[fixture]
pub fn catalog() -> MemoryCatalog {
    MemoryCatalog {
        categories: vec![
            category(1, "Nến Thơm"),
            category(2, "Tinh Dầu Thiên Nhiên"),
            category(3, "Sáp Thơm"),
        ],
        products: vec![
            product(
                1,
                1,
                "Nến thơm Lavender Thyme",
                "Nến sáp đậu nành hương oải hương và cỏ xạ hương",
            ),
            product(2, 1, "Nến thơm Cam Quế", "Hương cam ngọt ấm áp"),
            product(3, 2, "Tinh dầu Sả Chanh", "Tinh dầu nguyên chất đuổi muỗi"),
            product(4, 2, "Tinh dầu Bạc Hà", "Mát lạnh, tỉnh táo"),
            product(5, 3, "Sáp thơm Vani", "Sáp thơm dùng cho đèn xông"),
        ],
        details: vec![
            detail(10, 1, "200g", "Oải hương"),
            detail(11, 2, "200g", "Cam Bergamot"),
            detail(12, 2, "100g", "Quế"),
            detail(13, 3, "10ml", "Sả chanh"),
            detail(14, 4, "10ml", "Bạc hà"),
            detail(15, 5, "100g", "Vani"),
        ],
        prices: vec![
            price(10, 80_000, 0),
            price(11, 150_000, 0),
            price(12, 120_000, 0),
            price(13, 95_000, 10),
            price(14, 150_000, 0),
            price(15, 60_000, 0),
        ],
        ratings: [
            ratings(1, &[5.0, 4.0]),
            ratings(2, &[4.0]),
            ratings(3, &[5.0, 5.0, 4.0]),
            ratings(4, &[4.0, 5.0]),
            ratings(5, &[3.0]),
        ]
        .concat(),
    }
}

/// Classifier double that ignores the utterance.
pub struct ScriptedClassifier {
    intent: Option<SearchIntent>,
}

impl ScriptedClassifier {
    pub fn returning(intent: SearchIntent) -> Self {
        Self {
            intent: Some(intent),
        }
    }

    pub fn failing() -> Self {
        Self { intent: None }
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, _utterance: &str) -> AssistantResult<SearchIntent> {
        self.intent
            .clone()
            .ok_or_else(|| AssistantError::Decode("classifier returned garbage".into()))
    }
}

/// Chat responder double whose service is always down.
pub struct UnreachableResponder;

#[async_trait]
impl ChatResponder for UnreachableResponder {
    async fn respond(&self, _utterance: &str) -> AssistantResult<String> {
        Err(AssistantError::Status { status: 503 })
    }
}

/// Catalog wrapper that injects failures into selected calls.
#[derive(Default)]
pub struct FaultyCatalog {
    pub inner: MemoryCatalog,
    pub failing_ratings: HashSet<ProductId>,
    pub fail_products: bool,
    pub fail_categories: bool,
    pub fail_price_listing: bool,
}

impl FaultyCatalog {
    pub fn new(inner: MemoryCatalog) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

fn down(what: &str) -> CatalogError {
    CatalogError::Unavailable(format!("{what} service down"))
}

#[async_trait]
impl CatalogStore for FaultyCatalog {
    async fn categories(&self) -> CatalogResult<Vec<Category>> {
        if self.fail_categories {
            return Err(down("category"));
        }
        self.inner.categories().await
    }

    async fn products(&self) -> CatalogResult<Vec<Product>> {
        if self.fail_products {
            return Err(down("product"));
        }
        self.inner.products().await
    }

    async fn details_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<ProductDetail>> {
        self.inner.details_for_product(product_id).await
    }

    async fn prices(&self) -> CatalogResult<Vec<Price>> {
        if self.fail_price_listing {
            return Err(down("price"));
        }
        self.inner.prices().await
    }

    async fn prices_for_detail(&self, detail_id: DetailId) -> CatalogResult<Vec<Price>> {
        self.inner.prices_for_detail(detail_id).await
    }

    async fn ratings_for_product(&self, product_id: ProductId) -> CatalogResult<Vec<Rating>> {
        if self.failing_ratings.contains(&product_id) {
            return Err(down("rating"));
        }
        self.inner.ratings_for_product(product_id).await
    }
}

/// Engine over `store` whose classifier always yields `intent`.
pub fn engine(store: impl CatalogStore + 'static, intent: SearchIntent) -> SearchEngine {
    engine_with(store, ScriptedClassifier::returning(intent), AssemblyOptions::default())
}

pub fn engine_with(
    store: impl CatalogStore + 'static,
    classifier: ScriptedClassifier,
    options: AssemblyOptions,
) -> SearchEngine {
    engine_with_responder(store, classifier, CannedResponder::new(CHAT_REPLY), options)
}

pub fn engine_with_responder(
    store: impl CatalogStore + 'static,
    classifier: ScriptedClassifier,
    responder: impl ChatResponder + 'static,
    options: AssemblyOptions,
) -> SearchEngine {
    let catalog = CatalogAccessor::new(Arc::new(store), Duration::from_secs(2), 4);
    SearchEngine::new(catalog, Arc::new(classifier), Arc::new(responder), options)
}
