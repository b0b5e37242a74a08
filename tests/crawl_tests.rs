//! Integration tests for the site crawler

use async_trait::async_trait;
use rankscout::config::UserAgentConfig;
use rankscout::crawler::{CrawlOrchestrator, CrawlSettings};
use rankscout::fetch::{FetchError, FetchOptions, FetchedPage, HttpPageFetcher, PageFetcher};
use rankscout::{
    CancellationFlag, NoopProgress, ProgressEvent, ProgressSink, RunOutcome, ScoutError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Page</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

fn settings() -> CrawlSettings {
    CrawlSettings {
        page_timeout: Duration::from_secs(5),
        max_failed_batches: 3,
        max_iterations: 1000,
    }
}

fn page(url: &str, html: &str) -> FetchedPage {
    FetchedPage {
        url: url.to_string(),
        status_code: 200,
        html: html.to_string(),
        text: "text".to_string(),
        links: Vec::new(),
    }
}

/// Serves scripted HTML per URL and counts every fetch
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<String, String>,
    fallback_html: Option<String>,
    delay: Option<Duration>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }

    fn fetch_counts(&self) -> HashMap<String, usize> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.pages.get(url).or(self.fallback_html.as_ref()) {
            Some(html) => Ok(page(url, html)),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            }),
        }
    }
}

/// Every page links to two children of itself, so the site never ends
struct EndlessSite;

#[async_trait]
impl PageFetcher for EndlessSite {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let html = format!(r#"<a href="{0}/l">L</a><a href="{0}/r">R</a>"#, url);
        Ok(page(url, &html))
    }
}

/// Records event types and cancels once the first batch is reported
#[derive(Default)]
struct RecordingSink {
    flag: CancellationFlag,
    cancel_after_batch: bool,
    events: Mutex<Vec<&'static str>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.event_type());
        if self.cancel_after_batch && matches!(event, ProgressEvent::CrawlBatch { .. }) {
            self.flag.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }
}

#[tokio::test]
async fn test_crawls_wiremock_site_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<h1>Home</h1>
               <a href="/about">About</a>
               <a href="/blog/">Blog</a>
               <a href="/missing">Missing</a>
               <a href="/brochure.pdf">PDF</a>
               <a href="https://other.org/x">Elsewhere</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(r#"<h1>About</h1><a href="/">Home</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(html_page("<h1>Blog</h1><img src=\"/x.png\">"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let user_agent = UserAgentConfig {
        respect_robots: false,
        ..UserAgentConfig::default()
    };
    let fetcher = Arc::new(HttpPageFetcher::new(&user_agent).unwrap());
    let crawler = CrawlOrchestrator::new(fetcher, Arc::new(NoopProgress), settings());

    let report = crawler
        .crawl(&server.uri(), 10, 2, Duration::ZERO)
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.total_links_visited, 4);
    assert!(report.remaining_urls.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].url.ends_with("/missing"));
    assert!(report.failures[0].reason.contains("404"));

    let home = &report.pages[0];
    assert_eq!(home.h1_tags, vec!["Home"]);
    assert_eq!(home.external_links, vec!["https://other.org/x"]);
    assert!(report
        .visited_urls
        .iter()
        .all(|url| !url.ends_with(".pdf")));

    let blog = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/blog"))
        .unwrap();
    assert_eq!(blog.images.len(), 1);
    assert_eq!(blog.images[0].alt, None);
}

#[tokio::test]
async fn test_aborts_after_consecutive_empty_batches() {
    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
        .collect();
    let fetcher = Arc::new(ScriptedFetcher::default().with_page("https://dead.example", &links));
    let crawler = CrawlOrchestrator::new(fetcher.clone(), Arc::new(NoopProgress), settings());

    let result = crawler
        .crawl("https://dead.example", 50, 2, Duration::ZERO)
        .await;

    assert!(matches!(result, Err(ScoutError::SystemicFailure(_))));
    // Seed batch plus three failed batches of two
    assert_eq!(fetcher.total_fetches(), 7);
}

#[tokio::test]
async fn test_successful_batch_resets_failure_streak() {
    let seed_links: String = (0..4)
        .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
        .collect();
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_page("https://flaky.example", &seed_links)
            .with_page("https://flaky.example/p2", "<p>ok</p>"),
    );
    let crawler = CrawlOrchestrator::new(
        fetcher,
        Arc::new(NoopProgress),
        CrawlSettings {
            max_failed_batches: 2,
            ..settings()
        },
    );

    // One URL per batch: seed, p0 fails, p1 fails
    let result = crawler
        .crawl("https://flaky.example", 10, 1, Duration::ZERO)
        .await;
    assert!(matches!(result, Err(ScoutError::SystemicFailure(_))));

    // seed, p0 fails, p1 ok, p2 fails, p3 ok
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_page("https://flaky.example", &seed_links)
            .with_page("https://flaky.example/p1", "<p>ok</p>")
            .with_page("https://flaky.example/p3", "<p>ok</p>"),
    );
    let crawler = CrawlOrchestrator::new(
        fetcher,
        Arc::new(NoopProgress),
        CrawlSettings {
            max_failed_batches: 2,
            ..settings()
        },
    );
    let report = crawler
        .crawl("https://flaky.example", 10, 1, Duration::ZERO)
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.failures.len(), 2);
}

#[tokio::test]
async fn test_never_exceeds_max_pages() {
    let crawler = CrawlOrchestrator::new(Arc::new(EndlessSite), Arc::new(NoopProgress), settings());

    let report = crawler
        .crawl("https://endless.example", 5, 2, Duration::ZERO)
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(report.total_pages, 5);
    assert_eq!(report.visited_urls.len(), 5);
    assert!(!report.remaining_urls.is_empty());
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let all_links = r#"<a href="/">h</a><a href="/a">a</a><a href="/b/">b</a>
                       <a href="/c#section">c</a><a href="https://site.example/a?utm_source=x">a</a>"#;
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_page("https://site.example", all_links)
            .with_page("https://site.example/a", all_links)
            .with_page("https://site.example/b", all_links)
            .with_page("https://site.example/c", all_links),
    );
    let crawler = CrawlOrchestrator::new(fetcher.clone(), Arc::new(NoopProgress), settings());

    let report = crawler
        .crawl("https://site.example/", 20, 3, Duration::ZERO)
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(report.total_pages, 4);
    let counts = fetcher.fetch_counts();
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|&count| count == 1), "{:?}", counts);
}

#[tokio::test]
async fn test_www_and_bare_host_fetched_once() {
    let home = r#"<a href="https://www.example.com/about">About</a>
                  <a href="https://example.com/about">About</a>
                  <a href="https://WWW.example.com/">Home</a>"#;
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_page("https://example.com", home)
            .with_page("https://example.com/about", "<p>About us</p>"),
    );
    let crawler = CrawlOrchestrator::new(fetcher.clone(), Arc::new(NoopProgress), settings());

    let report = crawler
        .crawl("https://example.com", 10, 5, Duration::ZERO)
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(
        report.visited_urls,
        vec!["https://example.com", "https://example.com/about"]
    );
    assert_eq!(report.total_pages, 2);
    assert!(report.failures.is_empty());
    let counts = fetcher.fetch_counts();
    assert_eq!(counts.len(), 2);
    assert!(counts.values().all(|&count| count == 1), "{:?}", counts);
}

#[tokio::test]
async fn test_cancellation_stops_before_next_batch() {
    let sink = Arc::new(RecordingSink {
        cancel_after_batch: true,
        ..RecordingSink::default()
    });
    let crawler = CrawlOrchestrator::new(Arc::new(EndlessSite), sink.clone(), settings());

    let outcome = crawler
        .crawl("https://endless.example", 100, 1, Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    let events = sink.events.lock().unwrap().clone();
    assert_eq!(events, vec!["crawl_started", "crawl_batch"]);
}

#[tokio::test]
async fn test_progress_events_bracket_the_crawl() {
    let sink = Arc::new(RecordingSink::default());
    let crawler = CrawlOrchestrator::new(Arc::new(EndlessSite), sink.clone(), settings());

    crawler
        .crawl("https://endless.example", 3, 1, Duration::ZERO)
        .await
        .unwrap();

    let events = sink.events.lock().unwrap().clone();
    assert_eq!(events.first(), Some(&"crawl_started"));
    assert_eq!(events.last(), Some(&"crawl_finished"));
    assert_eq!(events.iter().filter(|e| **e == "crawl_batch").count(), 3);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let fetcher = Arc::new(ScriptedFetcher {
        delay: Some(Duration::from_secs(5)),
        fallback_html: Some("<p>slow</p>".to_string()),
        ..ScriptedFetcher::default()
    });
    let crawler = CrawlOrchestrator::new(
        fetcher,
        Arc::new(NoopProgress),
        CrawlSettings {
            page_timeout: Duration::from_millis(50),
            max_failed_batches: 1,
            ..settings()
        },
    );

    let result = crawler
        .crawl("https://slow.example", 5, 1, Duration::ZERO)
        .await;
    match result {
        Err(ScoutError::SystemicFailure(message)) => {
            assert!(message.contains("slow.example"));
        }
        other => panic!("expected systemic failure, got {:?}", other.map(|o| o.is_cancelled())),
    }
}
