use serde::Deserialize;

/// Main configuration structure for RankScout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub research: ResearchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub generator: GeneratorConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub exclude: Vec<DomainEntry>,
}

/// Site crawler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages to visit in one crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum number of page fetches in flight per batch
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Politeness delay between batches (seconds)
    #[serde(rename = "crawl-delay")]
    pub crawl_delay: f64,

    /// Timeout for fetching and parsing a single page (seconds)
    #[serde(rename = "page-timeout")]
    pub page_timeout: u64,

    /// Consecutive batches without a parsed page before the crawl is aborted
    #[serde(rename = "max-failed-batches")]
    pub max_failed_batches: u32,

    /// Upper bound on loop iterations, independent of the page budget
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_concurrent: 5,
            crawl_delay: 1.0,
            page_timeout: 60,
            max_failed_batches: 3,
            max_iterations: 1000,
        }
    }
}

/// Recursive research configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Number of search queries generated per iteration
    pub breadth: usize,

    /// Number of recursive iterations
    pub depth: usize,

    /// Search results fetched per query
    #[serde(rename = "results-per-query")]
    pub results_per_query: usize,

    /// Pages with less extracted text than this are skipped
    #[serde(rename = "min-content-chars")]
    pub min_content_chars: usize,

    /// Pages with more extracted text than this are skipped
    #[serde(rename = "max-content-chars")]
    pub max_content_chars: usize,

    /// Maximum learnings kept from a single page
    #[serde(rename = "max-learnings-per-page")]
    pub max_learnings_per_page: usize,

    /// Floor applied when halving breadth on each descent
    #[serde(rename = "min-child-breadth")]
    pub min_child_breadth: usize,

    /// Timeout for each page fetch during research (seconds)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            breadth: 4,
            depth: 2,
            results_per_query: 5,
            min_content_chars: 100,
            max_content_chars: 400_000,
            max_learnings_per_page: 3,
            min_child_breadth: 2,
            fetch_timeout: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Whether the HTTP fetcher honours robots.txt
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RankScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
            respect_robots: true,
        }
    }
}

/// Text generation backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout (seconds)
    pub timeout: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.3,
            timeout: 120,
        }
    }
}

/// Web search backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint accepting `{query, limit}`
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout (seconds)
    pub timeout: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.firecrawl.dev/v1/search".to_string(),
            api_key_env: "FIRECRAWL_API_KEY".to_string(),
            timeout: 30,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory where Markdown and JSON reports are written
    #[serde(rename = "report-dir")]
    pub report_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./rankscout.db".to_string(),
            report_dir: "./reports".to_string(),
        }
    }
}

/// Domain entry for the exclusion list
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}
