//! Typed, fault-tolerant reads against the Catalog Store.
//!
//! Only the product listing is allowed to fail a search. Every other read degrades to a
//! documented default (no categories, no prices, no details, unrated) and logs a warning.
//! Per-product lookups fan out concurrently, capped at a fixed number in flight.

use super::{CatalogError, CatalogResult, CatalogStore};
use crate::types::{
    Category, DetailId, Price, Product, ProductDetail, ProductId, RatingAggregate,
};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Price records grouped by the detail they price.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    by_detail: AHashMap<DetailId, Vec<Price>>,
}

impl PriceTable {
    pub fn new(prices: Vec<Price>) -> Self {
        let mut by_detail: AHashMap<DetailId, Vec<Price>> = AHashMap::new();
        for price in prices {
            by_detail.entry(price.product_detail_id).or_default().push(price);
        }
        Self { by_detail }
    }

    /// The price in force for `detail_id` at `at`.
    pub fn active_for(&self, detail_id: DetailId, at: DateTime<Utc>) -> Option<&Price> {
        select_active(self.by_detail.get(&detail_id)?, at)
    }
}

/// Picks the record whose window contains `at`, preferring the most recent start; when none
/// is in force, the most recently started record.
pub fn select_active(prices: &[Price], at: DateTime<Utc>) -> Option<&Price> {
    let in_force = prices
        .iter()
        .filter(|price| price.is_active_at(at))
        .max_by_key(|price| price.start_date);
    in_force.or_else(|| prices.iter().max_by_key(|price| price.start_date))
}

/// Wraps a [`CatalogStore`] with per-call timeouts and the degradation policy.
#[derive(Clone)]
pub struct CatalogAccessor {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
    fan_out: usize,
}

impl std::fmt::Debug for CatalogAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogAccessor")
            .field("timeout", &self.timeout)
            .field("fan_out", &self.fan_out)
            .finish_non_exhaustive()
    }
}

impl CatalogAccessor {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration, fan_out: usize) -> Self {
        Self {
            store,
            timeout,
            fan_out: fan_out.max(1),
        }
    }

    pub const fn fan_out(&self) -> usize {
        self.fan_out
    }

    async fn call<T>(&self, request: impl Future<Output = CatalogResult<T>>) -> CatalogResult<T> {
        tokio::time::timeout(self.timeout, request)
            .await
            .unwrap_or(Err(CatalogError::Timeout(self.timeout)))
    }

    /// All categories; empty when the store cannot be reached.
    pub async fn list_categories(&self) -> Vec<Category> {
        match self.call(self.store.categories()).await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!("Category listing failed, category names unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// All products. Failure here aborts the search.
    pub async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        self.call(self.store.products()).await.inspect_err(|e| {
            tracing::error!("Product listing failed: {}", e);
        })
    }

    /// Details of one product; empty on failure.
    pub async fn list_details(&self, product_id: ProductId) -> Vec<ProductDetail> {
        match self.call(self.store.details_for_product(product_id)).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("Detail lookup failed for product {}: {}", product_id, e);
                Vec::new()
            }
        }
    }

    /// Details for many products, fetched concurrently. Every id gets an entry.
    pub async fn details_for(
        &self,
        product_ids: &[ProductId],
    ) -> AHashMap<ProductId, Vec<ProductDetail>> {
        stream::iter(product_ids.iter().copied())
            .map(|product_id| async move { (product_id, self.list_details(product_id).await) })
            .buffered(self.fan_out)
            .collect::<AHashMap<_, _>>()
            .await
    }

    /// The full price table, or `None` when pricing data is unavailable.
    pub async fn list_all_prices(&self) -> Option<PriceTable> {
        match self.call(self.store.prices()).await {
            Ok(prices) => Some(PriceTable::new(prices)),
            Err(e) => {
                tracing::warn!("Price listing failed, price filtering disabled: {}", e);
                None
            }
        }
    }

    /// Price records of one detail; empty on failure.
    pub async fn prices_for_detail(&self, detail_id: DetailId) -> Vec<Price> {
        match self.call(self.store.prices_for_detail(detail_id)).await {
            Ok(prices) => prices,
            Err(e) => {
                tracing::warn!("Price lookup failed for detail {}: {}", detail_id, e);
                Vec::new()
            }
        }
    }

    /// Rating aggregate for one product; unrated on failure.
    pub async fn rating_for(&self, product_id: ProductId) -> RatingAggregate {
        match self.call(self.store.ratings_for_product(product_id)).await {
            Ok(ratings) => RatingAggregate::from_ratings(product_id, &ratings),
            Err(e) => {
                tracing::warn!("Rating lookup failed for product {}: {}", product_id, e);
                RatingAggregate::unrated(product_id)
            }
        }
    }

    /// Rating aggregates for many products, fetched concurrently.
    ///
    /// The map always has one entry per input id; a failed lookup yields an unrated aggregate
    /// and never fails the batch.
    pub async fn ratings_for(
        &self,
        product_ids: &[ProductId],
    ) -> AHashMap<ProductId, RatingAggregate> {
        stream::iter(product_ids.iter().copied())
            .map(|product_id| async move { (product_id, self.rating_for(product_id).await) })
            .buffered(self.fan_out)
            .collect::<AHashMap<_, _>>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::types::Rating;
    use assert2::check;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails rating lookups for odd ids and records peak concurrency.
    struct Probe {
        inner: MemoryCatalog,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for Probe {
        async fn categories(&self) -> CatalogResult<Vec<Category>> {
            Err(CatalogError::Unavailable("down".into()))
        }
        async fn products(&self) -> CatalogResult<Vec<Product>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.inner.products().await
        }
        async fn details_for_product(&self, id: ProductId) -> CatalogResult<Vec<ProductDetail>> {
            self.inner.details_for_product(id).await
        }
        async fn prices(&self) -> CatalogResult<Vec<Price>> {
            Err(CatalogError::Unavailable("down".into()))
        }
        async fn prices_for_detail(&self, id: DetailId) -> CatalogResult<Vec<Price>> {
            self.inner.prices_for_detail(id).await
        }
        async fn ratings_for_product(&self, id: ProductId) -> CatalogResult<Vec<Rating>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if id % 2 == 1 {
                return Err(CatalogError::Unavailable("rating service".into()));
            }
            Ok(vec![Rating {
                id,
                product_id: id,
                rating: 4.0,
            }])
        }
    }

    fn probe() -> Arc<Probe> {
        Arc::new(Probe {
            inner: MemoryCatalog::new(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_ratings_fan_out_is_bounded_and_total() {
        let store = probe();
        let accessor = CatalogAccessor::new(store.clone(), Duration::from_secs(1), 3);
        let ids: Vec<ProductId> = (1..=10).collect();

        let ratings = accessor.ratings_for(&ids).await;

        check!(ratings.len() == 10);
        check!(store.peak.load(Ordering::SeqCst) <= 3);
        check!(store.peak.load(Ordering::SeqCst) > 1);
        for id in ids {
            let rating = ratings[&id];
            if id % 2 == 1 {
                check!(!rating.has_rating);
                check!(rating.average == 0.0);
            } else {
                check!(rating.has_rating);
                check!(rating.average == 4.0);
            }
        }
    }

    #[tokio::test]
    async fn test_degraded_reads_use_defaults() {
        let accessor = CatalogAccessor::new(probe(), Duration::from_secs(1), 2);
        check!(accessor.list_categories().await.is_empty());
        check!(accessor.list_all_prices().await.is_none());
    }

    #[tokio::test]
    async fn test_product_listing_times_out() {
        let accessor = CatalogAccessor::new(probe(), Duration::from_millis(50), 2);
        let result = accessor.list_products().await;
        check!(matches!(result, Err(CatalogError::Timeout(_))));
    }

    fn price_at(id: i64, start_days_ago: Option<i64>, end_days_ago: Option<i64>) -> Price {
        let now = Utc::now();
        Price {
            id,
            product_detail_id: 1,
            base_price: Decimal::from(id),
            discount_percent: Decimal::ZERO,
            start_date: start_days_ago.map(|d| now - chrono::Duration::days(d)),
            end_date: end_days_ago.map(|d| now - chrono::Duration::days(d)),
        }
    }

    #[test]
    fn test_select_active_prefers_price_in_force() {
        let prices = vec![
            price_at(1, Some(30), Some(10)), // expired
            price_at(2, Some(5), None),      // in force
            price_at(3, Some(1), Some(-1)),  // in force, newer
        ];
        check!(select_active(&prices, Utc::now()).map(|p| p.id) == Some(3));
    }

    #[test]
    fn test_select_active_falls_back_to_latest_start() {
        let prices = vec![price_at(1, Some(30), Some(20)), price_at(2, Some(10), Some(5))];
        check!(select_active(&prices, Utc::now()).map(|p| p.id) == Some(2));
        check!(select_active(&[], Utc::now()).is_none());
    }
}
