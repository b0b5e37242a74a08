//! URL handling module for RankScout
//!
//! This module is the URL deduplicator shared by both orchestrators:
//! - canonicalization into a single comparable string form
//! - the "should this URL be fetched at all" decision
//! - domain helpers for separating internal from external links
//!
//! Everything here is pure: no I/O, no shared state.

mod domain;
mod filter;
mod normalize;

pub use domain::{domain_of, extract_domain, is_same_site, site_key};
pub use filter::{matches_wildcard, should_process, UrlFilter};
pub use normalize::{canonicalize, canonicalize_url, ensure_scheme};

/// Canonicalizes a URL and applies the filter in one step
///
/// Returns `None` when the URL should be skipped.
pub fn canonical_if_processable(filter: &UrlFilter, url_str: &str) -> Option<String> {
    if !filter.should_process(url_str) {
        return None;
    }
    let canonical = canonicalize(url_str);
    if filter.should_process(&canonical) {
        Some(canonical)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_if_processable() {
        let filter = UrlFilter::new(["*.tracker.io"]);
        assert_eq!(
            canonical_if_processable(&filter, "https://Example.com/a/#x"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(canonical_if_processable(&filter, "tel:123"), None);
        assert_eq!(
            canonical_if_processable(&filter, "https://px.tracker.io/p"),
            None
        );
    }
}
