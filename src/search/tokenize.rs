//! Text normalization and tokenization for accent-insensitive matching.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Tokens of this length or shorter are treated as noise words.
pub(crate) const MAX_NOISE_TOKEN_LENGTH: usize = 2;

/// Filler words customers wrap around the actual product terms. Stored pre-normalized.
pub(crate) const STOP_WORDS: &[&str] = &[
    "toi", "minh", "muon", "can", "tim", "mua", "cho", "giup", "xem", "loai", "san", "pham",
    "nao", "khong", "nhung", "cac", "mot", "voi", "duoc", "gia", "shop", "ban", "hay", "nhe",
    "the", "and", "for", "with", "want", "need", "some", "please",
];

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("punctuation pattern is valid"));

/// Lower-cases and strips combining marks so accented and plain forms compare equal.
///
/// `"Nến Oải Hương"` becomes `"nen oai huong"`. Letters without a decomposition (such as `đ`)
/// are left as they are.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .nfc()
        .collect()
}

/// Splits on whitespace and drops tokens of length two or less.
///
/// The input is expected to be normalized already; lengths are counted in characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > MAX_NOISE_TOKEN_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Normalizes then tokenizes.
pub fn normalized_tokens(text: &str) -> Vec<String> {
    tokenize(&normalize(text))
}

/// Replaces punctuation with spaces and collapses the whitespace, keeping case and accents.
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduces a conversational query to its content words for the second-chance search.
///
/// Punctuation is removed, stop words and noise tokens dropped, and the survivors re-joined.
pub fn simplify_query(query: &str) -> String {
    let normalized = normalize(query);
    let cleaned = PUNCTUATION.replace_all(&normalized, " ");
    tokenize(&cleaned)
        .into_iter()
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
