//! On-page SEO statistics for a crawl
//!
//! This module derives audit counters from crawled pages and prints them.

use crate::crawler::{CrawlReport, CrawledPage, PageFailure};
use serde::Serialize;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStatistics {
    /// Pages parsed by the crawl
    pub total_pages: usize,

    /// Claimed URLs that produced no page
    pub failed_urls: usize,

    /// Parsed pages whose final status was not 200
    pub non_ok_pages: usize,

    pub missing_title: usize,
    pub missing_meta_description: usize,
    pub missing_h1: usize,
    pub multiple_h1: usize,
    pub missing_viewport: usize,
    pub missing_canonical: usize,

    /// Titles shared by more than one page
    pub duplicate_titles: usize,

    pub total_images: usize,

    /// Images without an `alt` attribute
    pub images_missing_alt: usize,

    /// Images with `alt=""`
    pub images_empty_alt: usize,

    pub total_internal_links: usize,
    pub total_external_links: usize,
    pub avg_links_per_page: f64,
}

impl CrawlStatistics {
    /// Computes statistics over parsed pages and failures
    pub fn from_pages(pages: &[CrawledPage], failures: &[PageFailure]) -> Self {
        let mut stats = Self {
            total_pages: pages.len(),
            failed_urls: failures.len(),
            ..Self::default()
        };

        let mut titles: HashMap<&str, usize> = HashMap::new();
        let mut total_links = 0usize;

        for page in pages {
            if page.status_code != 200 {
                stats.non_ok_pages += 1;
            }
            match page.title.as_deref() {
                Some(title) => *titles.entry(title).or_default() += 1,
                None => stats.missing_title += 1,
            }
            if page.meta_description.is_none() {
                stats.missing_meta_description += 1;
            }
            match page.h1_tags.len() {
                0 => stats.missing_h1 += 1,
                1 => {}
                _ => stats.multiple_h1 += 1,
            }
            if page.viewport.is_none() {
                stats.missing_viewport += 1;
            }
            if page.canonical_url.is_none() {
                stats.missing_canonical += 1;
            }

            stats.total_images += page.images.len();
            for image in &page.images {
                match image.alt.as_deref() {
                    None => stats.images_missing_alt += 1,
                    Some("") => stats.images_empty_alt += 1,
                    Some(_) => {}
                }
            }

            stats.total_internal_links += page.internal_links.len();
            stats.total_external_links += page.external_links.len();
            total_links += page.links.len();
        }

        stats.duplicate_titles = titles.values().filter(|&&count| count > 1).count();
        if !pages.is_empty() {
            stats.avg_links_per_page = total_links as f64 / pages.len() as f64;
        }

        stats
    }

    pub fn from_report(report: &CrawlReport) -> Self {
        Self::from_pages(&report.pages, &report.failures)
    }

    /// Share of claimed URLs that produced a page, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_pages + self.failed_urls;
        if attempted == 0 {
            return 0.0;
        }
        (self.total_pages as f64 / attempted as f64) * 100.0
    }

    /// Issue counters with display labels, in report order
    pub fn issues(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Missing title", self.missing_title),
            ("Duplicate titles", self.duplicate_titles),
            ("Missing meta description", self.missing_meta_description),
            ("No h1", self.missing_h1),
            ("Multiple h1", self.multiple_h1),
            ("Missing viewport", self.missing_viewport),
            ("Missing canonical link", self.missing_canonical),
            ("Images missing alt", self.images_missing_alt),
            ("Non-200 pages", self.non_ok_pages),
            ("Failed URLs", self.failed_urls),
        ]
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages analyzed: {}", stats.total_pages);
    println!("  Failed URLs: {}", stats.failed_urls);
    println!("  Images: {}", stats.total_images);
    println!(
        "  Links: {} internal, {} external ({:.1} per page)",
        stats.total_internal_links, stats.total_external_links, stats.avg_links_per_page
    );
    println!();

    println!("Issues:");
    for (label, count) in stats.issues() {
        let percentage = if stats.total_pages > 0 {
            (count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} URLs parsed)",
        stats.success_rate(),
        stats.total_pages,
        stats.total_pages + stats.failed_urls
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ImageDescriptor, OpenGraph, SemanticFlags};
    use chrono::Utc;

    fn page(url: &str, title: Option<&str>, h1s: usize) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            html: String::new(),
            text_content: String::new(),
            title: title.map(str::to_string),
            meta_description: None,
            h1_tags: (0..h1s).map(|i| format!("h{}", i)).collect(),
            links: vec!["https://a.com".to_string(), "https://b.com".to_string()],
            internal_links: vec!["https://a.com".to_string()],
            external_links: vec!["https://b.com".to_string()],
            status_code: 200,
            semantic_flags: SemanticFlags::default(),
            open_graph: OpenGraph::default(),
            canonical_url: None,
            viewport: Some("width=device-width".to_string()),
            images: Vec::new(),
            crawl_timestamp: Utc::now(),
        }
    }

    fn image(alt: Option<&str>) -> ImageDescriptor {
        ImageDescriptor {
            src: "https://a.com/x.png".to_string(),
            alt: alt.map(str::to_string),
            width: None,
            height: None,
            loading: None,
        }
    }

    #[test]
    fn test_counts_issues() {
        let mut first = page("https://a.com", Some("Home"), 0);
        first.images = vec![image(None), image(Some("")), image(Some("Logo"))];
        let mut second = page("https://a.com/x", Some("Home"), 2);
        second.status_code = 404;
        second.meta_description = Some("desc".to_string());
        let third = page("https://a.com/y", None, 1);

        let failures = vec![PageFailure {
            url: "https://a.com/z".to_string(),
            reason: "timeout".to_string(),
        }];
        let stats = CrawlStatistics::from_pages(&[first, second, third], &failures);

        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.failed_urls, 1);
        assert_eq!(stats.non_ok_pages, 1);
        assert_eq!(stats.missing_title, 1);
        assert_eq!(stats.duplicate_titles, 1);
        assert_eq!(stats.missing_meta_description, 2);
        assert_eq!(stats.missing_h1, 1);
        assert_eq!(stats.multiple_h1, 1);
        assert_eq!(stats.total_images, 3);
        assert_eq!(stats.images_missing_alt, 1);
        assert_eq!(stats.images_empty_alt, 1);
        assert_eq!(stats.missing_canonical, 3);
        assert_eq!(stats.missing_viewport, 0);
        assert!((stats.avg_links_per_page - 2.0).abs() < f64::EPSILON);
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_crawl() {
        let stats = CrawlStatistics::from_pages(&[], &[]);
        assert_eq!(stats, CrawlStatistics::default());
        assert_eq!(stats.success_rate(), 0.0);
    }
}
