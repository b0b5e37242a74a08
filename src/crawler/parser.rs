//! HTML parser for on-page SEO signals
//!
//! Extracts from a fetched page:
//! - title, meta description, viewport and `<h1>` headings
//! - OpenGraph title/description/image
//! - `<link rel="canonical">`
//! - images with absolute `src`
//! - HTML5 semantic element flags
//! - links, partitioned into same-site and external

use crate::crawler::page::{CrawledPage, ImageDescriptor, OpenGraph, SemanticFlags};
use crate::fetch::{extract_links, resolve_link, FetchedPage};
use crate::url::{canonicalize, canonicalize_url, is_same_site};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Builds a `CrawledPage` from a fetched page
///
/// `canonical_url` is the URL the page was claimed under. Relative links
/// and image sources resolve against the fetcher's final URL. Links count
/// as internal when their host equals `site_host`, ignoring a leading
/// `www.`.
pub fn parse_page(canonical_url: &str, fetched: &FetchedPage, site_host: &str) -> CrawledPage {
    let document = Html::parse_document(&fetched.html);
    let base_url = Url::parse(&fetched.url)
        .or_else(|_| Url::parse(canonical_url))
        .ok();

    let meta = MetaTags::collect(&document);
    let (links, internal_links, external_links) = match &base_url {
        Some(base) => partition_links(&extract_links(&document, base), site_host),
        None => Default::default(),
    };

    CrawledPage {
        url: canonical_url.to_string(),
        html: fetched.html.clone(),
        text_content: fetched.text.clone(),
        title: first_text(&document, "title"),
        meta_description: meta.description,
        h1_tags: all_text(&document, "h1"),
        links,
        internal_links,
        external_links,
        status_code: fetched.status_code,
        semantic_flags: semantic_flags(&document),
        open_graph: meta.open_graph,
        canonical_url: base_url.as_ref().and_then(|b| canonical_link(&document, b)),
        viewport: meta.viewport,
        images: base_url
            .as_ref()
            .map(|b| extract_images(&document, b))
            .unwrap_or_default(),
        crawl_timestamp: Utc::now(),
    }
}

/// Canonicalizes and dedupes links, splitting them by site
///
/// Same-site links are rewritten onto `site_host`, so `www.` and bare
/// spellings of one page share a canonical URL.
fn partition_links(raw: &[String], site_host: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    let mut internal = Vec::new();
    let mut external = Vec::new();

    for link in raw {
        let Ok(mut url) = canonicalize_url(link) else {
            continue;
        };
        let same_site = is_same_site(&url, site_host);
        if same_site
            && url.host_str() != Some(site_host)
            && url.set_host(Some(site_host)).is_err()
        {
            continue;
        }
        let canonical = canonicalize(url.as_str());
        if !seen.insert(canonical.clone()) {
            continue;
        }
        if same_site {
            internal.push(canonical.clone());
        } else {
            external.push(canonical.clone());
        }
        all.push(canonical);
    }

    (all, internal, external)
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn all_text(document: &Html, css: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// `<meta>` values keyed by `name` or `property`, first occurrence wins
#[derive(Default)]
struct MetaTags {
    description: Option<String>,
    viewport: Option<String>,
    open_graph: OpenGraph,
}

impl MetaTags {
    fn collect(document: &Html) -> Self {
        let mut tags = Self::default();
        let Some(selector) = selector("meta[content]") else {
            return tags;
        };

        for element in document.select(&selector) {
            let el = element.value();
            let key = el
                .attr("name")
                .or_else(|| el.attr("property"))
                .map(|k| k.trim().to_ascii_lowercase());
            let content = non_empty(el.attr("content"));

            let slot = match key.as_deref() {
                Some("description") => &mut tags.description,
                Some("viewport") => &mut tags.viewport,
                Some("og:title") => &mut tags.open_graph.title,
                Some("og:description") => &mut tags.open_graph.description,
                Some("og:image") => &mut tags.open_graph.image,
                _ => continue,
            };
            if slot.is_none() {
                *slot = content;
            }
        }

        tags
    }
}

fn canonical_link(document: &Html, base_url: &Url) -> Option<String> {
    let selector = selector("link[rel][href]")?;
    document
        .select(&selector)
        .find(|el| {
            el.value()
                .attr("rel")
                .map(|rel| {
                    rel.split_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("canonical"))
                })
                .unwrap_or(false)
        })
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| resolve_link(href, base_url))
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageDescriptor> {
    let Some(selector) = selector("img") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let el = element.value();
            let src = el
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| el.attr("data-src"))?;
            let src = resolve_link(src, base_url)?;
            Some(ImageDescriptor {
                src,
                // An empty alt is meaningful (decorative image), so it is kept
                alt: el.attr("alt").map(|a| a.trim().to_string()),
                width: non_empty(el.attr("width")),
                height: non_empty(el.attr("height")),
                loading: non_empty(el.attr("loading")),
            })
        })
        .collect()
}

fn semantic_flags(document: &Html) -> SemanticFlags {
    let has = |tag: &str| {
        selector(tag)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false)
    };

    SemanticFlags {
        has_header: has("header"),
        has_nav: has("nav"),
        has_main: has("main"),
        has_footer: has("footer"),
        has_article: has("article"),
        has_section: has("section"),
        has_aside: has("aside"),
    }
}
