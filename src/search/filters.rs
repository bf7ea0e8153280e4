//! The filter pipeline: text, category, price and rating stages over the candidate set, plus
//! the size and scent matchers used later to pick each product's representative detail.
//!
//! Stages run strictly in order. The category, price and rating stages fail open: when a
//! stage cannot resolve its constraint, or would leave nothing behind, it is skipped and the
//! candidates pass through untouched.

use super::context::SearchContext;
use super::distance;
use super::lexicon::{category_keywords, is_scent_type};
use super::scoring::{ScoringQuery, rank, rank_matches};
use super::synonyms::{SynonymGroup, resolve};
use super::tokenize::{normalize, normalized_tokens};
use crate::types::{
    Category, CategoryId, Product, ProductDetail, ProductId, ScoredProduct, SearchFilters,
};
use ahash::AHashSet;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Edits tolerated between a filter token and a category name token.
const CATEGORY_TOKEN_DISTANCE: usize = 1;

/// What a stage did to the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The filter was not requested.
    Inactive,
    Applied { before: usize, after: usize },
    /// The filter was requested but could not be applied safely.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unresolved,
    NoData,
    WouldEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub text: StageOutcome,
    pub category: StageOutcome,
    pub price: StageOutcome,
    pub rating: StageOutcome,
}

/// Runs the product-level stages and returns the surviving candidates in ranked order.
pub async fn run_pipeline(
    ctx: &SearchContext<'_>,
    products: Vec<Product>,
    query: &ScoringQuery,
    filters: &SearchFilters,
) -> (Vec<ScoredProduct>, PipelineReport) {
    let (candidates, text) = text_stage(products, query);
    tracing::debug!(?text, "text stage");

    let (candidates, category) = match filters.category.as_deref() {
        Some(term) => category_stage(candidates, term, ctx.categories().await),
        None => (candidates, StageOutcome::Inactive),
    };
    tracing::debug!(?category, "category stage");

    let (candidates, price) = if filters.has_price_bounds() {
        price_stage(ctx, candidates, filters.price_min, filters.price_max).await
    } else {
        (candidates, StageOutcome::Inactive)
    };
    tracing::debug!(?price, "price stage");

    let (candidates, rating) = match filters.effective_min_rating() {
        Some(min_rating) => rating_stage(ctx, candidates, min_rating).await,
        None => (candidates, StageOutcome::Inactive),
    };
    tracing::debug!(?rating, "rating stage");

    let report = PipelineReport {
        text,
        category,
        price,
        rating,
    };
    (candidates, report)
}

/// Keeps positively scored products when there is a query; otherwise passes everything.
pub fn text_stage(
    products: Vec<Product>,
    query: &ScoringQuery,
) -> (Vec<ScoredProduct>, StageOutcome) {
    if query.is_empty() {
        return (rank(products, query), StageOutcome::Inactive);
    }
    let before = products.len();
    let ranked = rank_matches(products, query);
    let after = ranked.len();
    (ranked, StageOutcome::Applied { before, after })
}

pub fn category_stage(
    candidates: Vec<ScoredProduct>,
    term: &str,
    categories: &[Category],
) -> (Vec<ScoredProduct>, StageOutcome) {
    let ids = resolve_category_ids(term, categories);
    if ids.is_empty() {
        tracing::info!("Category '{}' did not resolve, skipping category filter", term);
        return (candidates, StageOutcome::Skipped(SkipReason::Unresolved));
    }
    keep_where(candidates, |scored| ids.contains(&scored.product.category_id))
}

/// Resolves a free-text category to catalog ids.
///
/// Tries, in order and stopping at the first non-empty result: containment against live
/// category names, the static keyword dictionary, then near-miss token matches.
pub fn resolve_category_ids(term: &str, categories: &[Category]) -> AHashSet<CategoryId> {
    let term = normalize(term);
    let term = term.trim();
    if term.is_empty() {
        return AHashSet::new();
    }

    let named: Vec<(CategoryId, String)> = categories
        .iter()
        .map(|category| (category.id, normalize(&category.name).trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let by_name: AHashSet<CategoryId> = named
        .iter()
        .filter(|(_, name)| name.contains(term) || term.contains(name.as_str()))
        .map(|(id, _)| *id)
        .collect();
    if !by_name.is_empty() {
        return by_name;
    }

    let by_keyword: AHashSet<CategoryId> = category_keywords()
        .iter()
        .filter(|(keyword, _)| term.contains(keyword.as_str()) || keyword.contains(term))
        .map(|(_, id)| *id)
        .collect();
    if !by_keyword.is_empty() {
        return by_keyword;
    }

    let term_tokens = normalized_tokens(term);
    named
        .iter()
        .filter(|(_, name)| {
            let name_tokens = normalized_tokens(name);
            term_tokens.iter().any(|t| {
                name_tokens
                    .iter()
                    .any(|n| distance::within(t, n, CATEGORY_TOKEN_DISTANCE))
            })
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Keeps products owning at least one detail whose final price is within the bounds.
pub async fn price_stage(
    ctx: &SearchContext<'_>,
    candidates: Vec<ScoredProduct>,
    min: Option<f64>,
    max: Option<f64>,
) -> (Vec<ScoredProduct>, StageOutcome) {
    let Some(prices) = ctx.prices().await else {
        return (candidates, StageOutcome::Skipped(SkipReason::NoData));
    };
    let bounds = PriceBounds::new(min, max);

    let ids: Vec<ProductId> = candidates.iter().map(|scored| scored.product.id).collect();
    let details = ctx.details_for(&ids).await;

    let in_range: AHashSet<ProductId> = details
        .iter()
        .filter(|(_, details)| {
            details.iter().any(|detail| {
                prices
                    .active_for(detail.id, ctx.now())
                    .is_some_and(|price| bounds.contains(price.final_price()))
            })
        })
        .map(|(id, _)| *id)
        .collect();

    keep_where(candidates, |scored| in_range.contains(&scored.product.id))
}

pub async fn rating_stage(
    ctx: &SearchContext<'_>,
    candidates: Vec<ScoredProduct>,
    min_rating: f64,
) -> (Vec<ScoredProduct>, StageOutcome) {
    let ids: Vec<ProductId> = candidates.iter().map(|scored| scored.product.id).collect();
    let ratings = ctx.ratings_for(&ids).await;
    keep_where(candidates, |scored| {
        ratings
            .get(&scored.product.id)
            .is_some_and(|rating| rating.average >= min_rating)
    })
}

/// Retains matching candidates unless that would leave none.
fn keep_where(
    candidates: Vec<ScoredProduct>,
    keep: impl Fn(&ScoredProduct) -> bool,
) -> (Vec<ScoredProduct>, StageOutcome) {
    let before = candidates.len();
    if before == 0 {
        return (candidates, StageOutcome::Applied { before, after: 0 });
    }
    if !candidates.iter().any(&keep) {
        return (candidates, StageOutcome::Skipped(SkipReason::WouldEmpty));
    }
    let kept: Vec<ScoredProduct> = candidates.into_iter().filter(|s| keep(s)).collect();
    let after = kept.len();
    (kept, StageOutcome::Applied { before, after })
}

/// Inclusive price range; a missing side is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.and_then(Decimal::from_f64),
            max: max.and_then(Decimal::from_f64),
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

/// How a requested scent is recognised in detail values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScentMatcher<'g> {
    Group(&'g SynonymGroup),
    /// No synonym group matched; compare the normalized term literally.
    Literal(String),
}

impl ScentMatcher<'_> {
    pub fn matches(&self, values: &str) -> bool {
        match self {
            Self::Group(group) => group.matches(values),
            Self::Literal(term) => {
                let values = normalize(values);
                let values = values.trim();
                !term.is_empty()
                    && !values.is_empty()
                    && (values.contains(term.as_str()) || term.contains(values))
            }
        }
    }
}

/// Size and scent constraints applied when choosing a product's representative detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFilter<'g> {
    size: Option<String>,
    scent: Option<ScentMatcher<'g>>,
}

impl<'g> DetailFilter<'g> {
    pub fn new(filters: &SearchFilters, groups: &'g [SynonymGroup]) -> Self {
        let size = filters
            .size
            .as_deref()
            .map(compact)
            .filter(|size| !size.is_empty());
        let scent = filters.scent.as_deref().map(|term| match resolve(term, groups) {
            Some(group) => ScentMatcher::Group(group),
            None => ScentMatcher::Literal(normalize(term).trim().to_string()),
        });
        Self { size, scent }
    }

    pub fn matches_size(&self, detail: &ProductDetail) -> bool {
        self.size.as_deref().is_some_and(|wanted| {
            let size = compact(&detail.size);
            !size.is_empty() && (size.contains(wanted) || wanted.contains(size.as_str()))
        })
    }

    pub fn matches_scent(&self, detail: &ProductDetail) -> bool {
        self.scent
            .as_ref()
            .is_some_and(|scent| is_scent_type(&detail.kind) && scent.matches(&detail.values))
    }

    pub fn scent(&self) -> Option<&ScentMatcher<'g>> {
        self.scent.as_ref()
    }

    /// Picks the detail that best represents a product.
    ///
    /// Active details are preferred over inactive ones. A size match narrows first, then a scent
    /// match; a narrowing that matches nothing is ignored. The first remaining detail wins.
    pub fn select<'d>(&self, details: &'d [ProductDetail]) -> Option<&'d ProductDetail> {
        let active: Vec<&ProductDetail> = details.iter().filter(|d| d.is_active).collect();
        let mut pool = if active.is_empty() {
            details.iter().collect()
        } else {
            active
        };

        if self.size.is_some() {
            pool = narrow(pool, |detail| self.matches_size(detail));
        }
        if self.scent.is_some() {
            pool = narrow(pool, |detail| self.matches_scent(detail));
        }
        pool.first().copied()
    }
}

fn narrow<'d>(
    pool: Vec<&'d ProductDetail>,
    keep: impl Fn(&ProductDetail) -> bool,
) -> Vec<&'d ProductDetail> {
    let narrowed: Vec<&ProductDetail> = pool.iter().copied().filter(|d| keep(*d)).collect();
    if narrowed.is_empty() { pool } else { narrowed }
}

/// Normalized with all whitespace removed, so "200 g" matches "200g".
fn compact(text: &str) -> String {
    normalize(text).split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::lexicon::scent_groups;
    use assert2::check;
    use rstest::rstest;

    fn category(id: CategoryId, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn scored(id: ProductId, category_id: CategoryId) -> ScoredProduct {
        ScoredProduct {
            product: Product {
                id,
                name: format!("Product {id}"),
                description: String::new(),
                category_id,
                images: vec![],
            },
            match_score: 1,
        }
    }

    fn detail(id: i64, size: &str, kind: &str, values: &str, active: bool) -> ProductDetail {
        ProductDetail {
            id,
            product_id: 1,
            size: size.to_string(),
            kind: kind.to_string(),
            values: values.to_string(),
            quantities: 10,
            is_active: active,
            images: vec![],
        }
    }

    fn ids(set: &AHashSet<CategoryId>) -> Vec<CategoryId> {
        let mut ids: Vec<_> = set.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[rstest]
    #[case("tinh dầu", vec![20])] // substring of a live name
    #[case("Nến Thơm Cao Cấp", vec![10])] // live name inside the term
    #[case("diffuser", vec![4])] // dictionary fallback
    #[case("nén thớm", vec![10])] // accent-insensitive containment
    #[case("tinh dav", vec![20])] // one-edit token match
    #[case("đồ chơi", vec![])]
    #[case("", vec![])]
    fn test_resolve_category_ids(#[case] term: &str, #[case] expected: Vec<CategoryId>) {
        let categories = vec![
            category(10, "Nến Thơm"),
            category(20, "Tinh Dầu Thiên Nhiên"),
        ];
        check!(ids(&resolve_category_ids(term, &categories)) == expected);
    }

    #[test]
    fn test_category_stage_keeps_matching_products() {
        let categories = vec![category(20, "Tinh Dầu Thiên Nhiên")];
        let candidates = vec![scored(1, 10), scored(2, 20), scored(3, 20)];
        let (kept, outcome) = category_stage(candidates, "tinh dầu", &categories);
        check!(kept.iter().map(|s| s.product.id).collect::<Vec<_>>() == vec![2, 3]);
        check!(outcome == StageOutcome::Applied { before: 3, after: 2 });
    }

    #[test]
    fn test_category_stage_fails_open() {
        let candidates = vec![scored(1, 10), scored(2, 20)];
        let (kept, outcome) = category_stage(candidates.clone(), "đồ chơi", &[]);
        check!(kept == candidates);
        check!(outcome == StageOutcome::Skipped(SkipReason::Unresolved));

        // Resolves to id 4 via the dictionary, but no candidate is in it.
        let (kept, outcome) = category_stage(candidates.clone(), "diffuser", &[]);
        check!(kept == candidates);
        check!(outcome == StageOutcome::Skipped(SkipReason::WouldEmpty));
    }

    #[rstest]
    #[case(None, Some(100_000.0), 80_000, true)]
    #[case(None, Some(100_000.0), 150_000, false)]
    #[case(Some(100_000.0), None, 100_000, true)]
    #[case(Some(50_000.0), Some(70_000.0), 80_000, false)]
    #[case(None, None, 1, true)]
    fn test_price_bounds(
        #[case] min: Option<f64>,
        #[case] max: Option<f64>,
        #[case] price: i64,
        #[case] expected: bool,
    ) {
        check!(PriceBounds::new(min, max).contains(Decimal::from(price)) == expected);
    }

    #[test]
    fn test_select_prefers_size_then_scent() {
        let details = vec![
            detail(1, "100g", "scent", "Oải hương", true),
            detail(2, "200 g", "scent", "Oải hương", true),
            detail(3, "200g", "scent", "Cam Bergamot", true),
        ];
        let filters = SearchFilters {
            size: Some("200G".into()),
            scent: Some("cam".into()),
            ..SearchFilters::default()
        };
        let filter = DetailFilter::new(&filters, scent_groups());
        check!(filter.select(&details).map(|d| d.id) == Some(3));

        let size_only = SearchFilters {
            size: Some("200g".into()),
            ..SearchFilters::default()
        };
        let filter = DetailFilter::new(&size_only, scent_groups());
        check!(filter.select(&details).map(|d| d.id) == Some(2));
    }

    #[test]
    fn test_select_ignores_unmatched_narrowing_and_inactive() {
        let details = vec![
            detail(1, "100g", "scent", "Vani", false),
            detail(2, "100g", "scent", "Hoa hồng", true),
        ];
        let filters = SearchFilters {
            scent: Some("bạc hà".into()),
            ..SearchFilters::default()
        };
        let filter = DetailFilter::new(&filters, scent_groups());
        check!(filter.select(&details).map(|d| d.id) == Some(2));
        check!(filter.select(&[]).is_none());
    }

    #[test]
    fn test_scent_requires_fragrance_type() {
        let filters = SearchFilters {
            scent: Some("cam".into()),
            ..SearchFilters::default()
        };
        let filter = DetailFilter::new(&filters, scent_groups());
        check!(filter.matches_scent(&detail(1, "", "Mùi hương", "Cam Bergamot", true)));
        check!(!filter.matches_scent(&detail(2, "", "color", "Cam", true)));
    }

    #[test]
    fn test_unknown_scent_matches_literally() {
        let filters = SearchFilters {
            scent: Some("Khói Sồi".into()),
            ..SearchFilters::default()
        };
        let filter = DetailFilter::new(&filters, scent_groups());
        check!(matches!(filter.scent(), Some(ScentMatcher::Literal(_))));
        check!(filter.matches_scent(&detail(1, "", "scent", "Khói sồi & da thuộc", true)));
    }
}
