//! Static knowledge base: scent synonym groups and the category keyword dictionary.
//!
//! Both tables are built once on first use and never mutated, so any number of concurrent
//! requests can read them.

use super::synonyms::SynonymGroup;
use super::tokenize::normalize;
use crate::types::CategoryId;
use std::sync::LazyLock;

static SCENT_GROUPS: LazyLock<Vec<SynonymGroup>> = LazyLock::new(|| {
    vec![
        SynonymGroup::new(
            "lavender",
            &["oải hương", "hoa oải hương", "lavender", "lavandin"],
        ),
        SynonymGroup::new(
            "citrus",
            &[
                "cam", "chanh", "bưởi", "quýt", "sả chanh", "bergamot", "orange", "lemon",
                "grapefruit",
            ],
        ),
        SynonymGroup::new("vanilla", &["vani", "va ni", "vanilla"]),
        SynonymGroup::new("rose", &["hoa hồng", "hồng", "rose"]),
        SynonymGroup::new(
            "woody",
            &[
                "gỗ đàn hương",
                "đàn hương",
                "tuyết tùng",
                "mùi gỗ",
                "sandalwood",
                "cedar",
            ],
        ),
        SynonymGroup::new("mint", &["bạc hà", "peppermint", "mint"]),
        SynonymGroup::new("coffee", &["cà phê", "coffee", "espresso"]),
        SynonymGroup::new("jasmine", &["hoa nhài", "hoa lài", "nhài", "jasmine"]),
        SynonymGroup::new("green tea", &["trà xanh", "green tea", "matcha"]),
        SynonymGroup::new("ocean", &["gió biển", "biển", "ocean", "sea breeze"]),
        SynonymGroup::new("cinnamon", &["quế", "cinnamon"]),
    ]
});

/// Known category phrases and the catalog category id each one denotes.
///
/// Used when the live category list is missing or does not name a category the way
/// customers do.
static CATEGORY_KEYWORDS: LazyLock<Vec<(String, CategoryId)>> = LazyLock::new(|| {
    [
        ("nến thơm", 1),
        ("nến", 1),
        ("candle", 1),
        ("tinh dầu", 2),
        ("essential oil", 2),
        ("sáp thơm", 3),
        ("wax melt", 3),
        ("máy khuếch tán", 4),
        ("khuếch tán", 4),
        ("diffuser", 4),
        ("phụ kiện", 5),
        ("accessory", 5),
        ("quà tặng", 6),
        ("set quà", 6),
        ("gift", 6),
    ]
    .into_iter()
    .map(|(keyword, id)| (normalize(keyword), id))
    .collect()
});

/// Detail `type` values that mark the variant's `values` as a fragrance.
const SCENT_TYPE_MARKERS: &[&str] = &["scent", "fragrance", "huong", "mui"];

pub fn scent_groups() -> &'static [SynonymGroup] {
    &SCENT_GROUPS
}

pub fn category_keywords() -> &'static [(String, CategoryId)] {
    &CATEGORY_KEYWORDS
}

/// Whether a detail's `type` denotes a fragrance attribute.
pub fn is_scent_type(kind: &str) -> bool {
    let kind = normalize(kind);
    SCENT_TYPE_MARKERS.iter().any(|marker| kind.contains(marker))
}
