//! Relevance scoring and ranking of products against a customer query.
//!
//! Scores are additive over the product's normalized name and description:
//! - +3 per keyword found in the name
//! - +1 per keyword found in the description
//! - +5 if the whole query appears in the name
//! - +2 if the whole query appears in the description

use super::synonyms::SynonymGroup;
use super::tokenize::{MAX_NOISE_TOKEN_LENGTH, normalize, tokenize};
use crate::types::{Product, ScoredProduct};

const NAME_KEYWORD_WEIGHT: u32 = 3;
const DESCRIPTION_KEYWORD_WEIGHT: u32 = 1;
const NAME_PHRASE_WEIGHT: u32 = 5;
const DESCRIPTION_PHRASE_WEIGHT: u32 = 2;

/// A query prepared once per request: its normalized text and the keywords to score with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringQuery {
    pub normalized: String,
    pub keywords: Vec<String>,
}

impl ScoringQuery {
    /// Normalizes `query` and derives keywords, expanded with the names of any synonym
    /// group the query mentions (so "oải hương" also matches "Lavender").
    pub fn new(query: &str, groups: &[SynonymGroup]) -> Self {
        let normalized = normalize(query).trim().to_string();
        let keywords = expand_keywords(&normalized, groups);
        Self {
            normalized,
            keywords,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Query tokens plus every whole name of each synonym group the query mentions, deduplicated
/// in first-seen order.
///
/// Names are kept as phrases: splitting "hoa oai huong" would let the bare "hoa" match every
/// flower-named product.
pub fn expand_keywords(normalized_query: &str, groups: &[SynonymGroup]) -> Vec<String> {
    let mut keywords = tokenize(normalized_query);

    let padded = format!(" {normalized_query} ");
    for group in groups {
        let mentioned = group
            .names()
            .any(|name| padded.contains(&format!(" {name} ")));
        if !mentioned {
            continue;
        }
        keywords.extend(
            group
                .names()
                .filter(|name| name.chars().count() > MAX_NOISE_TOKEN_LENGTH)
                .filter(|name| !padded.contains(&format!(" {name} ")))
                .map(str::to_string),
        );
    }

    let mut seen = ahash::AHashSet::new();
    keywords.retain(|keyword| seen.insert(keyword.clone()));
    keywords
}

/// Scores one product. Zero means "not a match".
pub fn score(product: &Product, normalized_query: &str, keywords: &[String]) -> u32 {
    let name = normalize(&product.name);
    let description = normalize(&product.description);

    let mut total = 0;
    for keyword in keywords {
        if name.contains(keyword.as_str()) {
            total += NAME_KEYWORD_WEIGHT;
        }
        if description.contains(keyword.as_str()) {
            total += DESCRIPTION_KEYWORD_WEIGHT;
        }
    }

    if !normalized_query.is_empty() {
        if name.contains(normalized_query) {
            total += NAME_PHRASE_WEIGHT;
        }
        if description.contains(normalized_query) {
            total += DESCRIPTION_PHRASE_WEIGHT;
        }
    }

    total
}

/// Scores every product and sorts by descending score.
///
/// The sort is stable: equal scores keep catalog order.
pub fn rank(products: Vec<Product>, query: &ScoringQuery) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = products
        .into_iter()
        .map(|product| {
            let match_score = score(&product, &query.normalized, &query.keywords);
            ScoredProduct {
                product,
                match_score,
            }
        })
        .collect();
    scored.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    scored
}

/// Ranks products and keeps only those with a positive score.
pub fn rank_matches(products: Vec<Product>, query: &ScoringQuery) -> Vec<ScoredProduct> {
    let mut ranked = rank(products, query);
    ranked.retain(|scored| scored.match_score > 0);
    ranked
}
