use core::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::consts::{CODEPOINT_URI, SIMPLE_ACCENT_URI, SIMPLE_CASE_ACCENT_URI, SIMPLE_CASE_URI};

/// String ordering used by value and general comparisons.
///
/// `equal` must agree with `compare`: `equal(a, b)` iff `compare(a, b) == Equal`.
/// Implementations only override it when equality is cheaper than ordering.
pub trait Collation: Send + Sync {
    fn uri(&self) -> &str;
    fn compare(&self, a: &str, b: &str) -> Ordering;
    fn equal(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
    fn key(&self, s: &str) -> String {
        s.to_string()
    }
}

impl core::fmt::Debug for dyn Collation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collation").field("uri", &self.uri()).finish()
    }
}

/// Unicode code point order. UTF-8 byte order coincides with it.
pub struct CodepointCollation;

impl Collation for CodepointCollation {
    fn uri(&self) -> &str {
        CODEPOINT_URI
    }
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }
    fn equal(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

/// Collation that compares code points of a folded key.
pub struct FoldingCollation {
    uri: &'static str,
    fold: fn(&str) -> String,
}

impl FoldingCollation {
    pub const fn new(uri: &'static str, fold: fn(&str) -> String) -> Self {
        Self { uri, fold }
    }

    pub fn case_insensitive() -> Self {
        Self::new(SIMPLE_CASE_URI, fold_case)
    }

    pub fn accent_insensitive() -> Self {
        Self::new(SIMPLE_ACCENT_URI, strip_accents)
    }

    pub fn case_accent_insensitive() -> Self {
        Self::new(SIMPLE_CASE_ACCENT_URI, |s| fold_case(&strip_accents(s)))
    }
}

impl Collation for FoldingCollation {
    fn uri(&self) -> &str {
        self.uri
    }
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }
    fn key(&self, s: &str) -> String {
        (self.fold)(s)
    }
}

fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

// NFD, then drop combining marks
fn strip_accents(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    use unicode_normalization::char::canonical_combining_class as ccc;
    s.nfd().filter(|&ch| ccc(ch) == 0).collect()
}

/// Registry of available collations, keyed by their URI.
pub struct CollationRegistry {
    by_uri: HashMap<String, Arc<dyn Collation>>,
}

impl Default for CollationRegistry {
    fn default() -> Self {
        let mut reg = Self {
            by_uri: HashMap::new(),
        };
        reg.insert(Arc::new(CodepointCollation));
        reg.insert(Arc::new(FoldingCollation::case_insensitive()));
        reg.insert(Arc::new(FoldingCollation::accent_insensitive()));
        reg.insert(Arc::new(FoldingCollation::case_accent_insensitive()));
        reg
    }
}

impl CollationRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, uri: &str) -> Option<Arc<dyn Collation>> {
        self.by_uri.get(uri).cloned()
    }
    pub fn insert(&mut self, collation: Arc<dyn Collation>) {
        self.by_uri.insert(collation.uri().to_string(), collation);
    }
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.by_uri.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CODEPOINT_URI, "a", "A", Ordering::Greater)]
    #[case(SIMPLE_CASE_URI, "a", "A", Ordering::Equal)]
    #[case(SIMPLE_ACCENT_URI, "café", "cafe", Ordering::Equal)]
    #[case(SIMPLE_ACCENT_URI, "Café", "cafe", Ordering::Less)]
    #[case(SIMPLE_CASE_ACCENT_URI, "Café", "cafe", Ordering::Equal)]
    fn builtin_collations(#[case] uri: &str, #[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        let reg = CollationRegistry::default();
        let c = reg.get(uri).unwrap();
        assert_eq!(c.compare(a, b), expected);
        assert_eq!(c.equal(a, b), expected == Ordering::Equal);
    }
}
