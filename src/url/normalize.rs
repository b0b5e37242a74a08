use crate::UrlError;
use url::form_urlencoded;
use url::Url;

/// Query parameters that only carry tracking noise
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "dclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "_gl",
    "ref",
    "ref_src",
    "igshid",
];

/// Canonicalizes a URL into the string form used for every set-membership check
///
/// # Canonicalization Steps
///
/// 1. Trim whitespace and parse; a scheme-less host such as `example.com/a`
///    is treated as `https://example.com/a`
/// 2. Lowercase scheme and host, drop the default port
/// 3. Collapse duplicate slashes and dot segments in the path
/// 4. Decode percent-escapes of unreserved characters, uppercase the rest
/// 5. Strip the trailing slash (the bare root becomes `https://host`)
/// 6. Drop the fragment
/// 7. Drop tracking parameters (`utm_*`, `fbclid`, `gclid`, ...), sort the rest
///
/// Strings that cannot be parsed as an absolute URL come back trimmed and
/// otherwise untouched, so the function is total and idempotent:
/// `canonicalize(&canonicalize(x)) == canonicalize(x)`.
///
/// # Examples
///
/// ```
/// use rankscout::url::canonicalize;
///
/// assert_eq!(canonicalize("HTTPS://Example.COM:443/Blog/?utm_source=x#top"), "https://example.com/Blog");
/// assert_eq!(canonicalize("https://example.com/"), "https://example.com");
/// ```
pub fn canonicalize(url_str: &str) -> String {
    let trimmed = url_str.trim();
    match canonicalize_url(trimmed) {
        Ok(url) => render(&url),
        Err(_) => trimmed.to_string(),
    }
}

/// Parses and normalizes a URL, keeping it as a structured `Url`
///
/// This applies every step of [`canonicalize`] except the final rendering,
/// and fails for strings that are not absolute HTTP(S) URLs.
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&ensure_scheme(trimmed))
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .map(|h| h.trim_end_matches('.').to_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?;
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter())
                .finish();
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Prefixes `https://` when the input carries no scheme
///
/// ```
/// use rankscout::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("example.com"), "https://example.com");
/// assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
/// ```
pub fn ensure_scheme(url_str: &str) -> String {
    let trimmed = url_str.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    }
}

/// Renders a normalized URL without the root slash
fn render(url: &Url) -> String {
    let mut out = format!("{}://", url.scheme());
    if let Some(host) = url.host_str() {
        out.push_str(host);
    }
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    if url.path() != "/" {
        out.push_str(url.path());
    }
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// Normalizes a URL path: dot segments, duplicate and trailing slashes, escapes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();

    for segment in path.split('/') {
        let decoded = decode_unreserved(segment);
        match decoded.as_str() {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(decoded),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Decodes escapes of unreserved characters and uppercases the remaining ones
///
/// Reserved characters stay encoded, which keeps the result stable under
/// repeated application.
fn decode_unreserved(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            let value = hex_value(bytes[i + 1]) * 16 + hex_value(bytes[i + 2]);
            if value.is_ascii_alphanumeric() || matches!(value, b'-' | b'.' | b'_' | b'~') {
                out.push(value);
            } else {
                out.push(b'%');
                out.push(bytes[i + 1].to_ascii_uppercase());
                out.push(bytes[i + 2].to_ascii_uppercase());
            }
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
