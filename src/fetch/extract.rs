//! Text and link extraction shared by the fetcher and the SEO parser

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is never visible content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Extracts visible text from an HTML document
///
/// With `only_main_content` set, text comes from the first `<main>` (or
/// failing that `<article>`) element when the document has one.
pub fn html_to_text(html: &str, only_main_content: bool) -> String {
    let document = Html::parse_document(html);

    let root = if only_main_content {
        ["main", "article", "[role='main']"]
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .find_map(|selector| document.select(&selector).next())
            .unwrap_or_else(|| document.root_element())
    } else {
        document.root_element()
    };

    let mut pieces = Vec::new();
    collect_text(root, &mut pieces);
    pieces.join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, pieces: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                pieces.extend(text.split_whitespace());
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, pieces);
                }
            }
            _ => {}
        }
    }
}

/// Extracts every followable `<a href>` as an absolute URL
///
/// Links with a `download` attribute are skipped; `rel="nofollow"` links
/// are kept. Duplicates are kept in document order.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves an href against a base URL
///
/// Returns `None` for empty and fragment-only hrefs, special schemes and
/// anything that does not resolve to http(s).
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
