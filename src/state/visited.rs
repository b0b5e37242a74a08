use crate::url::canonicalize;
use std::collections::HashSet;

/// Set of canonical URLs that have been claimed for fetching in one run
///
/// Claiming is a single check-and-insert on the canonical form, so a URL
/// can be claimed at most once no matter how it was spelled. Insertion
/// order is kept for reporting.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    members: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL; returns false if its canonical form was already present
    pub fn claim(&mut self, url: &str) -> bool {
        let canonical = canonicalize(url);
        if canonical.is_empty() || self.members.contains(&canonical) {
            return false;
        }
        self.members.insert(canonical.clone());
        self.order.push(canonical);
        true
    }

    /// Returns true if the URL (in any spelling) was claimed
    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(&canonicalize(url))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Claimed URLs in claim order
    pub fn urls(&self) -> &[String] {
        &self.order
    }

    /// Claims every URL of another set, keeping this set's order first
    pub fn merge(&mut self, other: &VisitedSet) {
        for url in &other.order {
            self.claim(url);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<S: AsRef<str>> FromIterator<S> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for url in iter {
            set.claim(url.as_ref());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once_across_spellings() {
        let mut visited = VisitedSet::new();
        assert!(visited.claim("https://Example.com/"));
        assert!(!visited.claim("https://example.com"));
        assert!(!visited.claim("https://example.com/#top"));
        assert_eq!(visited.len(), 1);
        assert_eq!(visited.urls(), ["https://example.com"]);
    }

    #[test]
    fn test_contains_uses_canonical_form() {
        let visited: VisitedSet = ["https://example.com/a/?utm_source=x"].into_iter().collect();
        assert!(visited.contains("https://EXAMPLE.com/a"));
        assert!(!visited.contains("https://example.com/b"));
    }

    #[test]
    fn test_empty_url_is_never_claimed() {
        let mut visited = VisitedSet::new();
        assert!(!visited.claim("   "));
        assert!(visited.is_empty());
    }

    #[test]
    fn test_merge_is_union_preserving_order() {
        let mut a: VisitedSet = ["https://a.com/1", "https://a.com/2"].into_iter().collect();
        let b: VisitedSet = ["https://a.com/2", "https://b.com/1"].into_iter().collect();
        a.merge(&b);
        assert_eq!(
            a.into_vec(),
            vec!["https://a.com/1", "https://a.com/2", "https://b.com/1"]
        );
    }
}
