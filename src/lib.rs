//! RankScout: SEO site crawling and recursive web research
//!
//! This crate implements the two orchestration engines behind an SEO
//! toolkit: a bounded, concurrency-limited site crawler that extracts
//! on-page SEO signals, and a depth/breadth-bounded recursive research loop
//! that turns a topic into a sourced report. Page fetching, web search and
//! text generation are injected as trait objects.

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod progress;
pub mod research;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for RankScout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Generation error: {0}")]
    Generation(#[from] generate::GenerationError),

    #[error("Search error: {0}")]
    Search(#[from] research::SearchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Systemic failure: {0}")]
    SystemicFailure(String),

    #[error("Run cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for RankScout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Terminal outcome of a crawl or research run that did not fail
///
/// Cancellation is not an error: callers can tell "the user stopped this"
/// apart from "this broke" by matching on this type instead of the error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    /// The run reached its natural end
    Completed(T),
    /// The run was stopped through its progress sink
    Cancelled,
}

impl<T> RunOutcome<T> {
    /// Returns true if the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    /// Converts an internal result into an outcome, mapping `ScoutError::Cancelled`
    pub fn from_result(result: Result<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Self::Completed(value)),
            Err(ScoutError::Cancelled) => Ok(Self::Cancelled),
            Err(e) => Err(e),
        }
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlReport, CrawledPage};
pub use progress::{CancellationFlag, NoopProgress, ProgressEvent, ProgressSink, TracingProgress};
pub use research::{ResearchOrchestrator, ResearchReport};
pub use state::{PageState, VisitedSet};
pub use url::{canonicalize, should_process, UrlFilter};
