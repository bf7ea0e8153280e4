//! Catalog entities, the structured search intent, and the response payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub type ProductId = i64;
pub type CategoryId = i64;
pub type DetailId = i64;

/// Structured intent produced by the external classifier for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_search: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: SearchFilters,
}

/// Classifiers send `null` for fields that do not apply to the utterance.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SearchIntent {
    /// A plain conversational classification.
    pub fn chat() -> Self {
        Self::default()
    }

    pub fn search(query: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            is_search: true,
            query: query.into(),
            filters,
        }
    }
}

/// Optional constraints extracted from the utterance. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireFilters")]
pub struct SearchFilters {
    pub category: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub size: Option<String>,
    pub scent: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub feature: Option<String>,
    pub min_rating: Option<f64>,
}

impl SearchFilters {
    pub fn has_price_bounds(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    /// Minimum rating, only when it actually constrains anything.
    pub fn effective_min_rating(&self) -> Option<f64> {
        self.min_rating.filter(|r| *r > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Classifier payloads are loosely shaped: blank strings stand in for "absent" and the price
/// bounds sometimes arrive nested under `priceRange`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFilters {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    price_min: Option<f64>,
    #[serde(default)]
    price_max: Option<f64>,
    #[serde(default)]
    price_range: Option<WirePriceRange>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    scent: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    feature: Option<String>,
    #[serde(default)]
    min_rating: Option<f64>,
}

#[derive(Deserialize)]
struct WirePriceRange {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<WireFilters> for SearchFilters {
    fn from(wire: WireFilters) -> Self {
        let (range_min, range_max) = wire
            .price_range
            .map_or((None, None), |range| (range.min, range.max));

        Self {
            category: non_blank(wire.category),
            price_min: wire.price_min.or(range_min),
            price_max: wire.price_max.or(range_max),
            size: non_blank(wire.size),
            scent: non_blank(wire.scent),
            kind: non_blank(wire.kind),
            feature: non_blank(wire.feature),
            min_rating: wire.min_rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: DetailId,
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub values: String,
    #[serde(default)]
    pub quantities: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<Image>,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub id: i64,
    pub product_detail_id: DetailId,
    pub base_price: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl Price {
    /// Discount clamped into `[0, 100]`.
    pub fn discount(&self) -> Decimal {
        self.discount_percent
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    /// `base * (1 - discount/100)` when discounted, otherwise the base price.
    pub fn final_price(&self) -> Decimal {
        let discount = self.discount();
        if discount > Decimal::ZERO {
            self.base_price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED)
        } else {
            self.base_price
        }
    }

    /// Whether `at` lies inside the record's validity window (open bounds allowed).
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date.is_none_or(|start| start <= at) && self.end_date.is_none_or(|end| at <= end)
    }
}

/// A raw customer rating as stored by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(default)]
    pub id: i64,
    pub product_id: ProductId,
    pub rating: f64,
}

/// Per-request rating summary for one product.
///
/// `has_rating` separates "never rated" from "rated exactly zero"; `average` alone cannot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub product_id: ProductId,
    pub average: f64,
    pub count: usize,
    pub has_rating: bool,
}

impl RatingAggregate {
    pub const fn unrated(product_id: ProductId) -> Self {
        Self {
            product_id,
            average: 0.0,
            count: 0,
            has_rating: false,
        }
    }

    pub fn from_ratings(product_id: ProductId, ratings: &[Rating]) -> Self {
        if ratings.is_empty() {
            return Self::unrated(product_id);
        }
        let total: f64 = ratings.iter().map(|r| r.rating).sum();
        Self {
            product_id,
            average: total / ratings.len() as f64,
            count: ratings.len(),
            has_rating: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredProduct {
    pub product: Product,
    pub match_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSummary {
    pub id: DetailId,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub values: String,
    pub quantities: i64,
}

impl From<&ProductDetail> for DetailSummary {
    fn from(detail: &ProductDetail) -> Self {
        Self {
            id: detail.id,
            size: detail.size.clone(),
            kind: detail.kind.clone(),
            values: detail.values.clone(),
            quantities: detail.quantities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub base_price: Decimal,
    pub discount_percent: Decimal,
    pub final_price: Decimal,
}

impl From<&Price> for PriceSummary {
    fn from(price: &Price) -> Self {
        Self {
            base_price: price.base_price,
            discount_percent: price.discount(),
            final_price: price.final_price(),
        }
    }
}

/// A ranked product joined with its chosen detail, price, rating and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProduct {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub match_score: u32,
    pub detail: Option<DetailSummary>,
    pub price: Option<PriceSummary>,
    pub rating: f64,
    pub rating_count: usize,
    pub has_rating: bool,
    pub stars: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub url: String,
    pub image: Option<String>,
}

/// Exactly one of these is produced per inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchResponse {
    Chat {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Search {
        result_text: String,
        products: Vec<EnrichedProduct>,
        filters_applied: SearchFilters,
    },
    #[serde(rename_all = "camelCase")]
    NoMatch {
        result_text: String,
        suggested_products: Vec<ProductSummary>,
    },
}

impl SearchResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Search { .. } => "search",
            Self::NoMatch { .. } => "no_match",
        }
    }

    /// The human-readable text of the response, whatever its kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Chat { text } => text,
            Self::Search { result_text, .. } | Self::NoMatch { result_text, .. } => result_text,
        }
    }
}
