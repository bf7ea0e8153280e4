//! Synonym groups and resolution of free-text attribute terms to a canonical group.

use super::distance;
use super::tokenize::{MAX_NOISE_TOKEN_LENGTH, normalize};

/// Maximum edit distance tolerated between a term and an alias.
const FUZZY_ALIAS_DISTANCE: usize = 2;

/// A family of interchangeable attribute terms, e.g. every way of saying "lavender".
///
/// Names are stored normalized, so comparisons are accent and case insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymGroup {
    pub canonical_name: String,
    pub aliases: Vec<String>,
}

impl SynonymGroup {
    pub fn new(canonical_name: &str, aliases: &[&str]) -> Self {
        Self {
            canonical_name: normalize(canonical_name),
            aliases: aliases.iter().map(|alias| normalize(alias)).collect(),
        }
    }

    /// Canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Alias tokens long enough to be meaningful on their own.
    pub fn alias_tokens(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .flat_map(|alias| alias.split_whitespace())
            .filter(|token| token.chars().count() > MAX_NOISE_TOKEN_LENGTH)
    }

    /// Whether free text (e.g. a detail's `values`) names this group.
    ///
    /// Matches on whole-name containment in either direction, then on partial alias tokens.
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize(text);
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.names()
            .any(|name| text.contains(name) || name.contains(text))
            || self.alias_tokens().any(|token| text.contains(token))
    }
}

/// Resolves `term` to the first group that matches it.
///
/// Passes run in priority order over all groups: exact or substring match, then aliases within
/// two edits, then partial overlap with alias tokens. `None` means the caller should fall back
/// to matching the raw term literally.
pub fn resolve<'a>(term: &str, groups: &'a [SynonymGroup]) -> Option<&'a SynonymGroup> {
    let term = normalize(term);
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let by_containment = groups.iter().find(|group| {
        group
            .names()
            .any(|name| term == name || term.contains(name) || name.contains(term))
    });
    if by_containment.is_some() {
        return by_containment;
    }

    let by_edit_distance = groups.iter().find(|group| {
        group
            .aliases
            .iter()
            .any(|alias| distance::within(term, alias, FUZZY_ALIAS_DISTANCE))
    });
    if by_edit_distance.is_some() {
        return by_edit_distance;
    }

    groups.iter().find(|group| {
        group
            .alias_tokens()
            .any(|token| term.contains(token) || token.contains(term))
    })
}

/// Every name a filter term may appear as: the resolved group's names, or the literal term.
pub fn expand_term(term: &str, groups: &[SynonymGroup]) -> Vec<String> {
    match resolve(term, groups) {
        Some(group) => group.names().map(str::to_string).collect(),
        None => vec![normalize(term).trim().to_string()],
    }
}
