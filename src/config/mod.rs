//! Configuration module for RankScout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a missing section falls back to sensible values.
//!
//! # Example
//!
//! ```no_run
//! use rankscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rankscout.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DomainEntry, GeneratorConfig, OutputConfig, ResearchConfig,
    SearchConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config_with_hash, load_config, load_config_with_hash,
    parse_config,
};
pub use validation::{
    validate, validate_breadth, validate_crawl_delay, validate_depth, MAX_BREADTH, MAX_DEPTH,
};
