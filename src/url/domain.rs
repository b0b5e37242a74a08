use url::Url;

/// Extracts the lowercase host from a URL
///
/// ```
/// use url::Url;
/// use rankscout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the lowercase host from a URL string, if it parses
pub fn domain_of(url_str: &str) -> Option<String> {
    Url::parse(url_str.trim())
        .ok()
        .and_then(|url| extract_domain(&url))
}

/// Returns the host with a leading `www.` removed
///
/// Used only for site-membership comparisons; canonical URLs keep the
/// host exactly as served.
pub fn site_key(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether a URL belongs to the given site host
///
/// `www.example.com` and `example.com` are the same site; other
/// subdomains are not.
pub fn is_same_site(url: &Url, site_host: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            site_key(&host.to_lowercase()) == site_key(&site_host.to_lowercase())
        }
        None => false,
    }
}
