//! robots.txt fetching, parsing and per-origin caching
//!
//! Used by `HttpPageFetcher` when `respect-robots` is enabled. A robots.txt
//! that is missing, unreachable or not a 2xx response allows everything.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};

use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// How long fetched rules stay valid
const ROBOTS_TTL_HOURS: i64 = 24;

/// Fetches and parses `<origin>/robots.txt`
pub async fn fetch_robots(client: &Client, origin: &Url) -> ParsedRobots {
    let robots_url = match origin.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!("No robots.txt at {} ({})", robots_url, response.status());
            return ParsedRobots::allow_all();
        }
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(_) => ParsedRobots::allow_all(),
    }
}

/// Per-origin cache of robots.txt rules
///
/// The lock is never held across a network request, so two concurrent
/// lookups for a cold origin may both fetch; the later insert wins.
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    agent: String,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    /// `agent` is the product token matched against `User-agent` lines
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Returns the rules for the URL's origin, fetching them if needed
    pub async fn rules_for(&self, url: &Url) -> ParsedRobots {
        let origin = url.origin().ascii_serialization();
        let ttl = chrono::Duration::hours(ROBOTS_TTL_HOURS);

        {
            let entries = self.entries.lock().await;
            if let Some(cached) = entries.get(&origin) {
                if !cached.is_stale(ttl) {
                    return cached.rules.clone();
                }
            }
        }

        let rules = fetch_robots(&self.client, url).await;
        self.entries
            .lock()
            .await
            .insert(origin, CachedRobots::new(rules.clone()));
        rules
    }

    pub async fn is_allowed(&self, url: &Url) -> bool {
        self.rules_for(url).await.is_allowed(url.as_str(), &self.agent)
    }

    pub async fn crawl_delay(&self, url: &Url) -> Option<f64> {
        self.rules_for(url).await.crawl_delay(&self.agent)
    }
}
