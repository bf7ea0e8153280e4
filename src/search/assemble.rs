//! Turns ranked candidates into the customer-facing response.
//!
//! The happy path enriches the top results with their representative detail, active price,
//! rating and category. The empty path builds relaxation hints and falls back twice: first to
//! a simplified-query search over the whole catalog, then to plain catalog suggestions.

use super::context::SearchContext;
use super::filters::DetailFilter;
use super::lexicon::{is_scent_type, scent_groups};
use super::scoring::{ScoringQuery, rank_matches};
use super::tokenize::simplify_query;
use crate::catalog::accessor::select_active;
use crate::types::{
    DetailSummary, EnrichedProduct, Price, PriceSummary, Product, ProductDetail, ProductId,
    ProductSummary, RatingAggregate, ScoredProduct, SearchFilters, SearchResponse,
};
use futures::{StreamExt, stream};
use rust_decimal::Decimal;
use std::fmt::Write;

const FULL_STAR: char = '★';
const HALF_STAR: char = '⯨';
const EMPTY_STAR: char = '☆';
const STAR_COUNT: usize = 5;

/// Presentation knobs for assembled responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// How many ranked products are enriched and shown.
    pub result_limit: usize,
    /// How many products a no-match response suggests.
    pub suggestion_limit: usize,
    /// Storefront root used to build product links.
    pub storefront_url: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            result_limit: 3,
            suggestion_limit: 3,
            storefront_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AssemblyOptions {
    pub fn product_url(&self, product_id: ProductId) -> String {
        format!(
            "{}/products/{}",
            self.storefront_url.trim_end_matches('/'),
            product_id
        )
    }
}

/// Enriches the top ranked products and renders the search response.
pub async fn assemble(
    ctx: &SearchContext<'_>,
    ranked: &[ScoredProduct],
    filters: &SearchFilters,
    detail_filter: &DetailFilter<'_>,
    options: &AssemblyOptions,
) -> SearchResponse {
    let top: Vec<&ScoredProduct> = ranked.iter().take(options.result_limit).collect();
    let ids: Vec<ProductId> = top.iter().map(|scored| scored.product.id).collect();

    let details = ctx.details_for(&ids).await;
    let ratings = ctx.ratings_for(&ids).await;

    let chosen: Vec<Option<ProductDetail>> = top
        .iter()
        .map(|scored| {
            details
                .get(&scored.product.id)
                .and_then(|details| detail_filter.select(details))
                .cloned()
        })
        .collect();
    let prices = resolve_prices(ctx, &chosen).await;

    let mut products = Vec::with_capacity(top.len());
    for ((scored, detail), price) in top.into_iter().zip(&chosen).zip(&prices) {
        let id = scored.product.id;
        let rating = ratings
            .get(&id)
            .copied()
            .unwrap_or_else(|| RatingAggregate::unrated(id));
        let category = ctx.category_name(scored.product.category_id).await;
        products.push(enrich(
            scored,
            detail.as_ref(),
            price.as_ref(),
            rating,
            category,
            options.product_url(id),
        ));
    }

    let result_text = render_results(&products);
    tracing::info!("Assembled {} of {} matches", products.len(), ranked.len());
    SearchResponse::Search {
        result_text,
        products,
        filters_applied: filters.clone(),
    }
}

/// Active price of each chosen detail, in input order.
///
/// Reads the request's price table when it loaded; otherwise asks the store per detail.
async fn resolve_prices(
    ctx: &SearchContext<'_>,
    chosen: &[Option<ProductDetail>],
) -> Vec<Option<Price>> {
    let now = ctx.now();
    if let Some(table) = ctx.prices().await {
        return chosen
            .iter()
            .map(|detail| {
                detail
                    .as_ref()
                    .and_then(|detail| table.active_for(detail.id, now))
                    .cloned()
            })
            .collect();
    }

    let catalog = ctx.catalog();
    let detail_ids: Vec<Option<i64>> = chosen
        .iter()
        .map(|detail| detail.as_ref().map(|detail| detail.id))
        .collect();
    stream::iter(detail_ids)
        .map(|detail_id| async move {
            let detail_id = detail_id?;
            let prices = catalog.prices_for_detail(detail_id).await;
            select_active(&prices, now).cloned()
        })
        .buffered(catalog.fan_out())
        .collect::<Vec<_>>()
        .await
}

pub fn enrich(
    scored: &ScoredProduct,
    detail: Option<&ProductDetail>,
    price: Option<&Price>,
    rating: RatingAggregate,
    category: Option<String>,
    url: String,
) -> EnrichedProduct {
    let product = &scored.product;
    let image = product
        .images
        .first()
        .or_else(|| detail.and_then(|detail| detail.images.first()))
        .map(|image| image.url.clone());

    EnrichedProduct {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        category,
        url,
        image,
        match_score: scored.match_score,
        detail: detail.map(DetailSummary::from),
        price: price.map(PriceSummary::from),
        rating: rating.average,
        rating_count: rating.count,
        has_rating: rating.has_rating,
        stars: stars(rating.average),
    }
}

/// Five-glyph star bar, rounded to the nearest half star. Zero is five empty stars.
pub fn stars(rating: f64) -> String {
    if rating.is_nan() || rating <= 0.0 {
        return EMPTY_STAR.to_string().repeat(STAR_COUNT);
    }
    let halves = (rating * 2.0).round().clamp(0.0, (STAR_COUNT * 2) as f64) as usize;
    let full = halves / 2;
    let half = halves % 2;
    let empty = STAR_COUNT - full - half;

    let mut bar = String::with_capacity(STAR_COUNT * 3);
    bar.extend(std::iter::repeat_n(FULL_STAR, full));
    bar.extend(std::iter::repeat_n(HALF_STAR, half));
    bar.extend(std::iter::repeat_n(EMPTY_STAR, empty));
    bar
}

/// Whole-dong VND amount with `.` thousands separators, e.g. `80.000đ`.
pub fn format_vnd(amount: Decimal) -> String {
    let digits = amount.round().abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    if amount.is_sign_negative() && !amount.round().is_zero() {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped.push('đ');
    grouped
}

/// The most frequent category and scent among the results, ties going to the first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedSuggestion {
    pub category: Option<String>,
    pub scent: Option<String>,
}

impl RelatedSuggestion {
    pub fn from_products(products: &[EnrichedProduct]) -> Self {
        let category = most_common(products.iter().filter_map(|p| p.category.as_deref()));
        let scent = most_common(
            products
                .iter()
                .filter_map(|p| p.detail.as_ref())
                .filter(|detail| is_scent_type(&detail.kind))
                .map(|detail| detail.values.trim())
                .filter(|values| !values.is_empty()),
        );
        Self {
            category: category.map(str::to_string),
            scent: scent.map(str::to_string),
        }
    }

    pub fn nudges(&self) -> Vec<String> {
        let mut nudges = Vec::new();
        if let Some(category) = &self.category {
            nudges.push(format!(
                "Bạn có thể xem thêm các sản phẩm khác trong danh mục {category}."
            ));
        }
        if let Some(scent) = &self.scent {
            nudges.push(format!(
                "Nếu bạn thích mùi {scent}, shop còn nhiều sản phẩm cùng mùi hương này."
            ));
        }
        nudges
    }
}

fn most_common<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (item, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((item, count)),
        })
        .map(|(item, _)| item)
}

fn render_results(products: &[EnrichedProduct]) -> String {
    let mut text = format!("Mình tìm thấy {} sản phẩm phù hợp:\n", products.len());
    for (i, product) in products.iter().enumerate() {
        let _ = write!(text, "{}. {}", i + 1, product.name);
        if let Some(detail) = &product.detail {
            let variant: Vec<&str> = [detail.size.trim(), detail.values.trim()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect();
            if !variant.is_empty() {
                let _ = write!(text, " ({})", variant.join(", "));
            }
        }
        let _ = writeln!(text);

        match &product.price {
            Some(price) if price.discount_percent > Decimal::ZERO => {
                let _ = writeln!(
                    text,
                    "   Giá: {} (giảm {}% từ {})",
                    format_vnd(price.final_price),
                    price.discount_percent.normalize(),
                    format_vnd(price.base_price)
                );
            }
            Some(price) => {
                let _ = writeln!(text, "   Giá: {}", format_vnd(price.final_price));
            }
            None => {
                let _ = writeln!(text, "   Giá: liên hệ");
            }
        }

        if product.has_rating {
            let _ = writeln!(
                text,
                "   Đánh giá: {} {:.1}/5 ({} đánh giá)",
                product.stars, product.rating, product.rating_count
            );
        } else {
            let _ = writeln!(text, "   Đánh giá: {} (chưa có đánh giá)", product.stars);
        }
        let _ = writeln!(text, "   {}", product.url);
    }

    for nudge in RelatedSuggestion::from_products(products).nudges() {
        let _ = writeln!(text, "{nudge}");
    }
    text.trim_end().to_string()
}

/// Builds the no-match response: relaxation hints plus at least one suggestion when the
/// catalog has any products.
pub fn no_match(
    catalog: Vec<Product>,
    query: &str,
    filters: &SearchFilters,
    options: &AssemblyOptions,
) -> SearchResponse {
    let hints = relaxation_hints(filters);
    let limit = options.suggestion_limit.max(1);

    let similar = similar_products(&catalog, query, limit);
    let retried = !similar.is_empty();
    let suggestions: Vec<Product> = if retried {
        similar
    } else {
        catalog.into_iter().take(limit).collect()
    };
    tracing::info!(
        "No match; suggesting {} products ({})",
        suggestions.len(),
        if retried { "simplified query" } else { "catalog" }
    );

    let suggested_products: Vec<ProductSummary> = suggestions
        .iter()
        .map(|product| summarize(product, options))
        .collect();
    let result_text = render_no_match(&hints, &suggested_products, retried);

    SearchResponse::NoMatch {
        result_text,
        suggested_products,
    }
}

/// Second-chance search over the whole, unfiltered catalog with only the query's content words.
pub fn similar_products(catalog: &[Product], query: &str, limit: usize) -> Vec<Product> {
    let simplified = simplify_query(query);
    if simplified.is_empty() {
        return Vec::new();
    }
    tracing::debug!("Retrying with simplified query '{}'", simplified);
    let query = ScoringQuery::new(&simplified, scent_groups());
    rank_matches(catalog.to_vec(), &query)
        .into_iter()
        .take(limit)
        .map(|scored| scored.product)
        .collect()
}

/// One hint per active filter, suggesting how to loosen it.
pub fn relaxation_hints(filters: &SearchFilters) -> Vec<String> {
    let mut hints = Vec::new();
    if let Some(scent) = &filters.scent {
        hints.push(format!("Thử chọn mùi hương khác thay cho \"{scent}\"."));
    }
    if filters.has_price_bounds() {
        let range = match (filters.price_min, filters.price_max) {
            (Some(min), Some(max)) => format!("{} - {}", vnd_from_f64(min), vnd_from_f64(max)),
            (Some(min), None) => format!("từ {}", vnd_from_f64(min)),
            (None, Some(max)) => format!("dưới {}", vnd_from_f64(max)),
            (None, None) => String::new(),
        };
        hints.push(format!("Mở rộng khoảng giá (hiện tại {range})."));
    }
    if let Some(size) = &filters.size {
        hints.push(format!("Thử kích thước khác thay cho \"{size}\"."));
    }
    if let Some(category) = &filters.category {
        hints.push(format!("Tìm ở danh mục khác ngoài \"{category}\"."));
    }
    if let Some(min_rating) = filters.effective_min_rating() {
        hints.push(format!("Giảm mức đánh giá tối thiểu (hiện tại {min_rating} sao)."));
    }
    hints
}

fn vnd_from_f64(amount: f64) -> String {
    use rust_decimal::prelude::FromPrimitive;
    Decimal::from_f64(amount).map_or_else(|| amount.to_string(), format_vnd)
}

fn summarize(product: &Product, options: &AssemblyOptions) -> ProductSummary {
    ProductSummary {
        id: product.id,
        name: product.name.clone(),
        url: options.product_url(product.id),
        image: product.images.first().map(|image| image.url.clone()),
    }
}

fn render_no_match(hints: &[String], suggestions: &[ProductSummary], retried: bool) -> String {
    let mut text =
        String::from("Xin lỗi, mình chưa tìm thấy sản phẩm nào đúng với yêu cầu của bạn.\n");
    if !hints.is_empty() {
        text.push_str("Bạn có thể thử:\n");
        for hint in hints {
            let _ = writeln!(text, "- {hint}");
        }
    }
    if !suggestions.is_empty() {
        text.push_str(if retried {
            "Có thể bạn sẽ thích những sản phẩm tương tự:\n"
        } else {
            "Tham khảo một vài sản phẩm của shop:\n"
        });
        for product in suggestions {
            let _ = writeln!(text, "- {}: {}", product.name, product.url);
        }
    }
    text.trim_end().to_string()
}
