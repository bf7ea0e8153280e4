//! Request-scoped catalog snapshot.
//!
//! A [`SearchContext`] lives for exactly one search. Categories and the price table are
//! fetched at most once; details and ratings are fetched per product on demand and memoised,
//! so the filter stages and the assembler never ask the Catalog Store twice for the same data.

use crate::catalog::{CatalogAccessor, CatalogResult, PriceTable};
use crate::types::{Category, CategoryId, Product, ProductDetail, ProductId, RatingAggregate};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell};

pub struct SearchContext<'a> {
    catalog: &'a CatalogAccessor,
    now: DateTime<Utc>,
    categories: OnceCell<Vec<Category>>,
    prices: OnceCell<Option<PriceTable>>,
    details: Mutex<AHashMap<ProductId, Vec<ProductDetail>>>,
    ratings: Mutex<AHashMap<ProductId, RatingAggregate>>,
}

impl std::fmt::Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("now", &self.now)
            .field("categories_loaded", &self.categories.initialized())
            .field("prices_loaded", &self.prices.initialized())
            .finish_non_exhaustive()
    }
}

impl<'a> SearchContext<'a> {
    pub fn new(catalog: &'a CatalogAccessor) -> Self {
        Self::at(catalog, Utc::now())
    }

    /// A context that evaluates price validity windows at `now`.
    pub fn at(catalog: &'a CatalogAccessor, now: DateTime<Utc>) -> Self {
        Self {
            catalog,
            now,
            categories: OnceCell::new(),
            prices: OnceCell::new(),
            details: Mutex::new(AHashMap::new()),
            ratings: Mutex::new(AHashMap::new()),
        }
    }

    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub const fn catalog(&self) -> &CatalogAccessor {
        self.catalog
    }

    pub async fn products(&self) -> CatalogResult<Vec<Product>> {
        self.catalog.list_products().await
    }

    pub async fn categories(&self) -> &[Category] {
        self.categories
            .get_or_init(|| self.catalog.list_categories())
            .await
    }

    pub async fn category_name(&self, id: CategoryId) -> Option<String> {
        self.categories()
            .await
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.clone())
    }

    /// The price table, or `None` when pricing data could not be loaded this request.
    pub async fn prices(&self) -> Option<&PriceTable> {
        self.prices
            .get_or_init(|| self.catalog.list_all_prices())
            .await
            .as_ref()
    }

    /// Details for each id, fetching only the ones not seen yet in this request.
    pub async fn details_for(
        &self,
        product_ids: &[ProductId],
    ) -> AHashMap<ProductId, Vec<ProductDetail>> {
        let missing: Vec<ProductId> = {
            let cached = self.details.lock().await;
            product_ids
                .iter()
                .copied()
                .filter(|id| !cached.contains_key(id))
                .collect()
        };

        if !missing.is_empty() {
            let fetched = self.catalog.details_for(&missing).await;
            self.details.lock().await.extend(fetched);
        }

        let cached = self.details.lock().await;
        product_ids
            .iter()
            .map(|id| (*id, cached.get(id).cloned().unwrap_or_default()))
            .collect()
    }

    /// Rating aggregates for each id, fetching only the ones not seen yet in this request.
    pub async fn ratings_for(
        &self,
        product_ids: &[ProductId],
    ) -> AHashMap<ProductId, RatingAggregate> {
        let missing: Vec<ProductId> = {
            let cached = self.ratings.lock().await;
            product_ids
                .iter()
                .copied()
                .filter(|id| !cached.contains_key(id))
                .collect()
        };

        if !missing.is_empty() {
            let fetched = self.catalog.ratings_for(&missing).await;
            self.ratings.lock().await.extend(fetched);
        }

        let cached = self.ratings.lock().await;
        product_ids
            .iter()
            .map(|id| {
                let rating = cached
                    .get(id)
                    .copied()
                    .unwrap_or_else(|| RatingAggregate::unrated(*id));
                (*id, rating)
            })
            .collect()
    }
}
