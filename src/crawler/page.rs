//! Crawl data model

use crate::state::{PageState, VisitedSet};
use crate::crawler::Frontier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Presence of HTML5 sectioning elements on a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticFlags {
    pub has_header: bool,
    pub has_nav: bool,
    pub has_main: bool,
    pub has_footer: bool,
    pub has_article: bool,
    pub has_section: bool,
    pub has_aside: bool,
}

/// OpenGraph tags used for social previews
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Absolute image URL
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub loading: Option<String>,
}

/// One fetched and parsed page
///
/// Identity is the canonical URL the page was claimed under, even when the
/// server redirected elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub html: String,
    pub text_content: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_tags: Vec<String>,
    /// Every canonical link on the page, internal and external
    pub links: Vec<String>,
    /// Same-site links (the only ones that are queued)
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub status_code: u16,
    pub semantic_flags: SemanticFlags,
    pub open_graph: OpenGraph,
    pub canonical_url: Option<String>,
    pub viewport: Option<String>,
    pub images: Vec<ImageDescriptor>,
    pub crawl_timestamp: DateTime<Utc>,
}

/// A claimed URL that produced no page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
}

/// Result of a finished crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub seed_url: String,
    pub pages: Vec<CrawledPage>,
    pub total_pages: usize,
    /// Number of URLs claimed, successful or not
    pub total_links_visited: usize,
    pub crawl_time_seconds: f64,
    pub visited_urls: Vec<String>,
    /// Frontier left over when the crawl stopped
    pub remaining_urls: Vec<String>,
    pub failures: Vec<PageFailure>,
}

/// Mutable state of one crawl run
///
/// `visited` and `frontier` never share a URL: a URL is popped from the
/// frontier before it is claimed, and only unvisited URLs are pushed.
#[derive(Debug, Default)]
pub struct CrawlState {
    pub visited: VisitedSet,
    pub frontier: Frontier,
    pub pages: Vec<CrawledPage>,
    pub failures: Vec<PageFailure>,
    states: HashMap<String, PageState>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a canonical URL; untouched URLs are `Discovered`
    pub fn state_of(&self, url: &str) -> PageState {
        self.states.get(url).copied().unwrap_or(PageState::Discovered)
    }

    /// Moves a canonical URL to `next`, rejecting illegal transitions
    pub fn transition(&mut self, url: &str, next: PageState) -> crate::Result<()> {
        let current = self.state_of(url);
        if !current.can_transition_to(next) {
            return Err(crate::ScoutError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.states.insert(url.to_string(), next);
        Ok(())
    }

    /// Number of URLs that ended in `state`
    pub fn count_in(&self, state: PageState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Queues a canonical URL unless it was already claimed or queued
    pub fn discover(&mut self, url: &str) -> bool {
        !self.visited.contains(url) && self.frontier.push(url)
    }

    pub fn into_report(self, seed_url: String, crawl_time_seconds: f64) -> CrawlReport {
        CrawlReport {
            seed_url,
            total_pages: self.pages.len(),
            total_links_visited: self.visited.len(),
            crawl_time_seconds,
            visited_urls: self.visited.into_vec(),
            remaining_urls: self.frontier.into_vec(),
            pages: self.pages,
            failures: self.failures,
        }
    }
}
