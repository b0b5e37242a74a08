use crate::config::DomainEntry;
use crate::url::domain::domain_of;

/// Schemes that never point at a crawlable document
const REJECTED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "file:", "about:"];

/// Path extensions of binary and media resources
const SKIPPED_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "tif", "tiff", "avif",
    // documents and archives
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "gz", "tar", "7z",
    // audio and video
    "mp3", "mp4", "m4a", "wav", "ogg", "webm", "avi", "mov", "wmv", "flv", "mkv",
    // executables and fonts
    "exe", "dmg", "msi", "apk", "woff", "woff2", "ttf", "eot", "otf",
    // static assets
    "css", "js",
];

/// Decides whether a URL should be fetched at all
///
/// Rejects empty strings, non-document schemes (`javascript:`, `mailto:`,
/// `tel:`, `data:`, `file:`, `about:`) and paths ending in a binary or
/// media extension. Relative references are accepted.
///
/// ```
/// use rankscout::url::should_process;
///
/// assert!(should_process("https://example.com/pricing"));
/// assert!(!should_process("mailto:team@example.com"));
/// assert!(!should_process("https://example.com/brochure.PDF"));
/// ```
pub fn should_process(url_str: &str) -> bool {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return false;
    }

    let lowered = trimmed.to_ascii_lowercase();
    if REJECTED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return false;
    }

    !has_skipped_extension(&lowered)
}

/// Checks the last path segment's extension, ignoring query and fragment
fn has_skipped_extension(lowered: &str) -> bool {
    let without_suffix = lowered
        .split(['?', '#'])
        .next()
        .unwrap_or(lowered);
    let path = match without_suffix.find("://") {
        Some(idx) => {
            let rest = &without_suffix[idx + 3..];
            rest.find('/').map(|p| &rest[p..]).unwrap_or("")
        }
        None => without_suffix,
    };

    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => SKIPPED_EXTENSIONS.contains(&ext),
        _ => false,
    }
}

/// Checks if a domain matches a wildcard pattern
///
/// `example.com` matches only itself; `*.example.com` matches the bare
/// domain and any subdomain depth. Comparison is case-insensitive.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// URL filter combining [`should_process`] with a domain exclusion list
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    excluded_domains: Vec<String>,
}

impl UrlFilter {
    /// Creates a filter that rejects the given domain patterns
    pub fn new<I, S>(excluded_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_domains: excluded_domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a filter from the `[[exclude]]` configuration entries
    pub fn from_entries(entries: &[DomainEntry]) -> Self {
        Self::new(entries.iter().map(|e| e.domain.clone()))
    }

    /// Returns true if the URL passes the scheme, extension and domain checks
    pub fn should_process(&self, url_str: &str) -> bool {
        if !should_process(url_str) {
            return false;
        }

        match domain_of(url_str) {
            Some(domain) => !self.is_excluded_domain(&domain),
            None => true,
        }
    }

    /// Returns true if the domain matches an exclusion pattern
    pub fn is_excluded_domain(&self, domain: &str) -> bool {
        self.excluded_domains
            .iter()
            .any(|pattern| matches_wildcard(pattern, domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(!should_process(""));
        assert!(!should_process("   "));
    }

    #[test]
    fn test_rejects_special_schemes() {
        for url in [
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:a@example.com",
            "tel:+15551234",
            "data:text/html,<p>x</p>",
            "file:///etc/passwd",
            "about:blank",
        ] {
            assert!(!should_process(url), "should reject {}", url);
        }
    }

    #[test]
    fn test_rejects_media_extensions() {
        assert!(!should_process("https://example.com/img/logo.png"));
        assert!(!should_process("https://example.com/files/report.pdf?download=1"));
        assert!(!should_process("https://example.com/video.MP4#t=10"));
        assert!(!should_process("/static/app.js"));
    }

    #[test]
    fn test_accepts_pages() {
        assert!(should_process("https://example.com"));
        assert!(should_process("https://example.com/blog/post-1"));
        assert!(should_process("https://example.com/page.html"));
        assert!(should_process("/relative/path"));
        assert!(should_process("https://example.com/v1.2/docs"));
    }

    #[test]
    fn test_extension_only_checked_on_path() {
        assert!(should_process("https://cdn.png.example.com/"));
        assert!(should_process("https://example.com/search?file=a.pdf"));
        assert!(should_process("https://example.com/.png"));
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(matches_wildcard("*.example.com", "example.com"));
        assert!(matches_wildcard("*.example.com", "a.b.example.com"));
        assert!(matches_wildcard("example.com", "EXAMPLE.com"));
        assert!(!matches_wildcard("example.com", "blog.example.com"));
        assert!(!matches_wildcard("*.example.com", "myexample.com"));
    }

    #[test]
    fn test_filter_excludes_domains() {
        let filter = UrlFilter::new(["*.facebook.com", "ads.example.com"]);
        assert!(!filter.should_process("https://www.facebook.com/share"));
        assert!(!filter.should_process("https://ads.example.com/click"));
        assert!(filter.should_process("https://example.com/pricing"));
        assert!(!filter.should_process("mailto:x@example.com"));
    }

    #[test]
    fn test_default_filter_matches_free_function() {
        let filter = UrlFilter::default();
        assert!(filter.should_process("https://example.com/a"));
        assert!(!filter.should_process("https://example.com/a.zip"));
    }
}
