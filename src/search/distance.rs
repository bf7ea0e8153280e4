//! Edit distance for approximate comparison of short attribute names.

use rapidfuzz::distance::levenshtein;

/// Classic Levenshtein distance: insertion, deletion and substitution each cost 1.
///
/// Counted over chars, so callers should pass normalized text.
pub fn distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

/// Whether two terms are within `max` edits of each other.
pub fn within(a: &str, b: &str, max: usize) -> bool {
    // Length difference is a lower bound on the distance.
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a.abs_diff(len_b) > max {
        return false;
    }
    distance(a, b) <= max
}
