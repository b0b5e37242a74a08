//! Page fetching
//!
//! Both orchestrators depend only on the [`PageFetcher`] trait. Retries,
//! caching and robots.txt are the fetcher's concern. [`HttpPageFetcher`]
//! is the reqwest-backed implementation used by the CLI.

mod extract;
mod http;

pub use extract::{extract_links, html_to_text, resolve_link};
pub use http::{build_http_client, HttpPageFetcher};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-request fetch options
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Upper bound for the whole request including the body
    pub timeout: Duration,
    /// Serve repeated requests for the same URL from memory
    pub use_cache: bool,
    /// Extract text only from `<main>`/`<article>` when present
    pub only_main_content: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            use_cache: false,
            only_main_content: false,
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status_code: u16,
    pub html: String,
    /// Visible text with whitespace collapsed
    pub text: String,
    /// Absolute http(s) links in document order
    pub links: Vec<String>,
}

/// Single-URL fetch failure
///
/// Always recoverable from the orchestrators' point of view: the URL is
/// logged and counted as visited without content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} is not HTML ({content_type})")]
    ContentMismatch { url: String, content_type: String },

    #[error("{url} is disallowed by robots.txt")]
    RobotsDenied { url: String },

    #[error("{url} returned an empty body")]
    Empty { url: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true for failures that a later attempt might not hit
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Capability to turn a URL into page content
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError>;
}
