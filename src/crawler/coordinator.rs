//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator is the only writer of `CrawlState`. Each iteration:
//! 1. Checks for cancellation
//! 2. Pops up to `min(max_concurrent, max_pages - visited)` URLs and claims
//!    them into the visited set before any fetch is dispatched
//! 3. Fetches and parses the batch concurrently, each page under its own
//!    timeout
//! 4. Queues newly found same-site links
//! 5. Emits progress and sleeps the politeness delay

use crate::config::CrawlerConfig;
use crate::crawler::page::{CrawlReport, CrawlState, CrawledPage, PageFailure};
use crate::crawler::parser::parse_page;
use crate::fetch::{FetchError, FetchOptions, PageFetcher};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::state::PageState;
use crate::url::{canonicalize, canonicalize_url, ensure_scheme, UrlFilter};
use crate::{Result, RunOutcome, ScoutError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Limits that stay fixed for the lifetime of an orchestrator
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub page_timeout: Duration,
    pub max_failed_batches: u32,
    pub max_iterations: u32,
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            page_timeout: Duration::from_secs(config.page_timeout),
            max_failed_batches: config.max_failed_batches,
            max_iterations: config.max_iterations,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

/// Bounded, concurrency-limited site crawler
pub struct CrawlOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    progress: Arc<dyn ProgressSink>,
    filter: UrlFilter,
    settings: CrawlSettings,
}

impl CrawlOrchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        progress: Arc<dyn ProgressSink>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            progress,
            filter: UrlFilter::default(),
            settings,
        }
    }

    /// Replaces the default filter (no excluded domains)
    pub fn with_filter(mut self, filter: UrlFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Crawls a site starting from `seed_url`
    ///
    /// The seed gets `https://` when it has no scheme. Returns
    /// `RunOutcome::Cancelled` if the progress sink reports cancellation
    /// before a batch, and `ScoutError::SystemicFailure` after
    /// `max_failed_batches` consecutive batches without a parsed page.
    pub async fn crawl(
        &self,
        seed_url: &str,
        max_pages: usize,
        max_concurrent: usize,
        crawl_delay: Duration,
    ) -> Result<RunOutcome<CrawlReport>> {
        RunOutcome::from_result(
            self.run(seed_url, max_pages, max_concurrent, crawl_delay)
                .await,
        )
    }

    async fn run(
        &self,
        seed_url: &str,
        max_pages: usize,
        max_concurrent: usize,
        crawl_delay: Duration,
    ) -> Result<CrawlReport> {
        if max_pages == 0 {
            return Err(ScoutError::InvalidInput("max_pages must be at least 1".into()));
        }
        if max_concurrent == 0 {
            return Err(ScoutError::InvalidInput(
                "max_concurrent must be at least 1".into(),
            ));
        }

        let seed = canonicalize_url(&ensure_scheme(seed_url))?;
        let site_host = seed
            .host_str()
            .map(str::to_string)
            .ok_or(crate::UrlError::MissingDomain)?;
        let seed = canonicalize(seed.as_str());
        if !self.filter.should_process(&seed) {
            return Err(ScoutError::InvalidInput(format!(
                "seed URL {} is excluded",
                seed
            )));
        }

        tracing::info!(
            "Starting crawl of {} (max {} pages, {} concurrent)",
            seed,
            max_pages,
            max_concurrent
        );
        self.progress.emit(&ProgressEvent::CrawlStarted {
            seed_url: seed.clone(),
            max_pages,
            max_concurrent,
        });

        let start_time = Instant::now();
        let mut state = CrawlState::new();
        state.discover(&seed);

        let mut failed_batches = 0u32;
        let mut iterations = 0u32;

        while state.visited.len() < max_pages && !state.frontier.is_empty() {
            if iterations >= self.settings.max_iterations {
                tracing::warn!(
                    "Stopping crawl after {} iterations with {} URLs still queued",
                    iterations,
                    state.frontier.len()
                );
                break;
            }
            iterations += 1;

            if self.progress.is_cancelled() {
                tracing::info!("Crawl of {} cancelled", seed);
                return Err(ScoutError::Cancelled);
            }

            let batch_size = max_concurrent.min(max_pages - state.visited.len());
            let batch = self.claim_batch(&mut state, batch_size)?;
            if batch.is_empty() {
                continue;
            }

            let fetches = batch.iter().map(|url| self.fetch_and_parse(url, &site_host));
            let results = join_all(fetches).await;

            let mut parsed = 0usize;
            let mut new_links = 0usize;
            for (url, result) in batch.iter().zip(results) {
                match result {
                    Ok(page) => {
                        state.transition(url, PageState::Parsed)?;
                        for link in &page.internal_links {
                            if self.filter.should_process(link) && state.discover(link) {
                                new_links += 1;
                            }
                        }
                        tracing::debug!(
                            "Parsed {} ({} internal, {} external links)",
                            url,
                            page.internal_links.len(),
                            page.external_links.len()
                        );
                        state.pages.push(page);
                        parsed += 1;
                    }
                    Err(reason) => {
                        tracing::warn!("Failed to crawl {}: {}", url, reason);
                        state.transition(url, PageState::FetchFailed)?;
                        state.failures.push(PageFailure {
                            url: url.clone(),
                            reason,
                        });
                    }
                }
            }

            if parsed == 0 {
                failed_batches += 1;
                if failed_batches >= self.settings.max_failed_batches {
                    tracing::error!(
                        "Aborting crawl of {}: {} consecutive batches produced no pages",
                        seed,
                        failed_batches
                    );
                    return Err(ScoutError::SystemicFailure(format!(
                        "{} consecutive batches failed while crawling {} ({} pages parsed)",
                        failed_batches,
                        seed,
                        state.pages.len()
                    )));
                }
            } else {
                failed_batches = 0;
            }

            self.progress.emit(&ProgressEvent::CrawlBatch {
                percent_complete: state.visited.len() as f64 / max_pages as f64 * 100.0,
                pages_analyzed: state.pages.len(),
                total_links_known: state.visited.len() + state.frontier.len(),
                current_url: batch.last().cloned(),
                new_links_found: new_links,
            });

            let more_to_do = state.visited.len() < max_pages && !state.frontier.is_empty();
            if more_to_do && !crawl_delay.is_zero() {
                tokio::time::sleep(crawl_delay).await;
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        tracing::info!(
            "Crawl completed: {} pages parsed, {} visited, {} remaining in {:.1}s",
            state.pages.len(),
            state.visited.len(),
            state.frontier.len(),
            elapsed
        );
        self.progress.emit(&ProgressEvent::CrawlFinished {
            pages_analyzed: state.pages.len(),
            visited: state.visited.len(),
            remaining: state.frontier.len(),
            elapsed_seconds: elapsed,
        });

        Ok(state.into_report(seed, elapsed))
    }

    /// Pops and claims up to `batch_size` URLs
    ///
    /// Each URL moves `Discovered -> Claimed -> Fetching` here, before any
    /// fetch starts.
    fn claim_batch(&self, state: &mut CrawlState, batch_size: usize) -> Result<Vec<String>> {
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            let Some(url) = state.frontier.pop() else {
                break;
            };

            if !self.filter.should_process(&url) {
                tracing::debug!("Skipping {}", url);
                if state.state_of(&url) == PageState::Discovered {
                    state.transition(&url, PageState::Skipped)?;
                }
                continue;
            }

            if !state.visited.claim(&url) {
                continue;
            }
            state.transition(&url, PageState::Claimed)?;
            state.transition(&url, PageState::Fetching)?;
            batch.push(url);
        }

        Ok(batch)
    }

    /// Fetches and parses one URL under the per-page timeout
    async fn fetch_and_parse(
        &self,
        url: &str,
        site_host: &str,
    ) -> std::result::Result<CrawledPage, String> {
        let options = FetchOptions {
            timeout: self.settings.page_timeout,
            use_cache: false,
            only_main_content: false,
        };

        let work = async {
            let fetched = self.fetcher.fetch(url, &options).await?;
            Ok::<_, FetchError>(parse_page(url, &fetched, site_host))
        };

        match tokio::time::timeout(self.settings.page_timeout, work).await {
            Ok(Ok(page)) => Ok(page),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }
            .to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPage;
    use crate::progress::NoopProgress;
    use async_trait::async_trait;

    /// Serves every URL as a page linking to `/a` and `/b`
    struct TwoLinks;

    #[async_trait]
    impl PageFetcher for TwoLinks {
        async fn fetch(
            &self,
            url: &str,
            _options: &FetchOptions,
        ) -> std::result::Result<FetchedPage, FetchError> {
            Ok(FetchedPage {
                url: url.to_string(),
                status_code: 200,
                html: r#"<a href="/a">A</a><a href="/b">B</a>"#.to_string(),
                text: "A B".to_string(),
                links: Vec::new(),
            })
        }
    }

    fn orchestrator() -> CrawlOrchestrator {
        CrawlOrchestrator::new(
            Arc::new(TwoLinks),
            Arc::new(NoopProgress),
            CrawlSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_single_page_crawl() {
        let report = orchestrator()
            .crawl("example.com", 1, 5, Duration::ZERO)
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(report.total_pages, 1);
        assert_eq!(report.visited_urls, vec!["https://example.com"]);
        assert_eq!(
            report.remaining_urls,
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn test_rejects_zero_limits() {
        let crawler = orchestrator();
        assert!(matches!(
            crawler.crawl("https://example.com", 0, 1, Duration::ZERO).await,
            Err(ScoutError::InvalidInput(_))
        ));
        assert!(matches!(
            crawler.crawl("https://example.com", 1, 0, Duration::ZERO).await,
            Err(ScoutError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_excluded_seed_is_invalid() {
        let crawler = orchestrator().with_filter(UrlFilter::new(["example.com"]));
        let result = crawler
            .crawl("https://example.com", 5, 1, Duration::ZERO)
            .await;
        assert!(matches!(result, Err(ScoutError::InvalidInput(_))));
    }

    #[test]
    fn test_settings_from_config() {
        let settings = CrawlSettings::from(&CrawlerConfig::default());
        assert_eq!(settings.page_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_failed_batches, 3);
    }
}
