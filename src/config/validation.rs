use crate::config::types::{
    Config, CrawlerConfig, DomainEntry, GeneratorConfig, OutputConfig, ResearchConfig,
    SearchConfig, UserAgentConfig,
};
use crate::robots::MAX_CRAWL_DELAY;
use crate::ConfigError;
use url::Url;

/// Checks a politeness delay in seconds (`0..=MAX_CRAWL_DELAY`)
pub fn validate_crawl_delay(seconds: f64) -> Result<(), ConfigError> {
    if seconds.is_finite() && (0.0..=MAX_CRAWL_DELAY).contains(&seconds) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "crawl-delay must be between 0 and {} seconds, got {}",
            MAX_CRAWL_DELAY, seconds
        )))
    }
}

/// Upper bound on research breadth (queries per iteration)
pub const MAX_BREADTH: usize = 10;

/// Upper bound on research depth (recursive iterations)
pub const MAX_DEPTH: usize = 5;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_research_config(&config.research)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_generator_config(&config.generator)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    validate_exclude_domains(&config.exclude)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    validate_crawl_delay(config.crawl_delay)?;

    if config.page_timeout < 1 {
        return Err(ConfigError::Validation(
            "page-timeout must be >= 1 second".to_string(),
        ));
    }

    if config.max_failed_batches < 1 {
        return Err(ConfigError::Validation(
            "max-failed-batches must be >= 1".to_string(),
        ));
    }

    if config.max_iterations < 1 {
        return Err(ConfigError::Validation(
            "max-iterations must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates research configuration
fn validate_research_config(config: &ResearchConfig) -> Result<(), ConfigError> {
    validate_breadth(config.breadth)?;
    validate_depth(config.depth)?;

    if config.results_per_query < 1 {
        return Err(ConfigError::Validation(
            "results-per-query must be >= 1".to_string(),
        ));
    }

    if config.max_content_chars <= config.min_content_chars {
        return Err(ConfigError::Validation(format!(
            "max-content-chars ({}) must be greater than min-content-chars ({})",
            config.max_content_chars, config.min_content_chars
        )));
    }

    if config.max_learnings_per_page < 1 {
        return Err(ConfigError::Validation(
            "max-learnings-per-page must be >= 1".to_string(),
        ));
    }

    if config.min_child_breadth < 1 {
        return Err(ConfigError::Validation(
            "min-child-breadth must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Checks a research breadth against the accepted bounds
pub fn validate_breadth(breadth: usize) -> Result<(), ConfigError> {
    if breadth < 1 || breadth > MAX_BREADTH {
        return Err(ConfigError::Validation(format!(
            "breadth must be between 1 and {}, got {}",
            MAX_BREADTH, breadth
        )));
    }
    Ok(())
}

/// Checks a research depth against the accepted bounds
pub fn validate_depth(depth: usize) -> Result<(), ConfigError> {
    if depth < 1 || depth > MAX_DEPTH {
        return Err(ConfigError::Validation(format!(
            "depth must be between 1 and {}, got {}",
            MAX_DEPTH, depth
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_generator_config(config: &GeneratorConfig) -> Result<(), ConfigError> {
    validate_endpoint("generator.endpoint", &config.endpoint)?;

    if config.model.is_empty() {
        return Err(ConfigError::Validation(
            "generator.model cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "generator.temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "generator.timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    validate_endpoint("search.endpoint", &config.endpoint)?;

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "search.timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Endpoints must be absolute HTTP(S) URLs
fn validate_endpoint(key: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", key, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            key,
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.report_dir.is_empty() {
        return Err(ConfigError::Validation(
            "report-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates exclusion domain entries
fn validate_exclude_domains(domains: &[DomainEntry]) -> Result<(), ConfigError> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid contact-email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid contact-email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid contact-email domain: '{}'",
            email
        )));
    }

    Ok(())
}
