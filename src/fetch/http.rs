//! reqwest-backed `PageFetcher`

use crate::config::UserAgentConfig;
use crate::fetch::{extract_links, html_to_text, FetchError, FetchOptions, FetchedPage, PageFetcher};
use crate::robots::RobotsCache;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Builds an HTTP client with the crawler's user agent
///
/// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches HTML pages over HTTP
///
/// # Request Flow
///
/// 1. Parse the URL; only http(s) is accepted
/// 2. Consult robots.txt when enabled
/// 3. Serve from the in-memory cache when `use_cache` is set and present
/// 4. GET with the per-request timeout, following up to 10 redirects
/// 5. Classify: non-2xx -> `Status`, non-HTML -> `ContentMismatch`,
///    blank body -> `Empty`
/// 6. Extract text and links
pub struct HttpPageFetcher {
    client: Client,
    robots: Option<RobotsCache>,
    cache: Mutex<HashMap<String, FetchedPage>>,
}

impl HttpPageFetcher {
    /// Creates a fetcher from the `[user-agent]` configuration
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let robots = config
            .respect_robots
            .then(|| RobotsCache::new(client.clone(), config.crawler_name.clone()));
        Ok(Self::with_client(client, robots))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, robots: Option<RobotsCache>) -> Self {
        Self {
            client,
            robots,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn robots(&self) -> Option<&RobotsCache> {
        self.robots.as_ref()
    }

    async fn cached(&self, url: &str) -> Option<FetchedPage> {
        self.cache.lock().await.get(url).cloned()
    }

    async fn fetch_uncached(
        &self,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<FetchedPage, FetchError> {
        let url_str = url.to_string();

        let response = self
            .client
            .get(url.as_str())
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url_str,
                content_type,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&url_str, e))?;

        if body.trim().is_empty() {
            return Err(FetchError::Empty { url: url_str });
        }

        let text = html_to_text(&body, options.only_main_content);
        let links = extract_links(&Html::parse_document(&body), &final_url);

        Ok(FetchedPage {
            url: final_url.to_string(),
            status_code: status.as_u16(),
            html: body,
            text,
            links,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(&parsed).await {
                return Err(FetchError::RobotsDenied {
                    url: url.to_string(),
                });
            }
        }

        if options.use_cache {
            if let Some(page) = self.cached(url).await {
                tracing::debug!("Cache hit for {}", url);
                return Ok(page);
            }
        }

        let page = self.fetch_uncached(&parsed, options).await?;

        if options.use_cache {
            self.cache
                .lock()
                .await
                .insert(url.to_string(), page.clone());
        }

        Ok(page)
    }
}

/// Accepts `text/html` and `application/xhtml+xml`; a missing header is
/// treated as HTML
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

fn classify_reqwest_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "connection refused".to_string(),
        }
    } else if error.is_redirect() {
        FetchError::Network {
            url: url.to_string(),
            message: "too many redirects".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
