//! Output writer traits and types
//!
//! This module defines the trait interface for report writers and the
//! error type shared by every output format.

use crate::crawler::CrawlReport;
use crate::output::stats::CrawlStatistics;
use crate::research::ResearchReport;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Which files a writer produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

/// Trait for report writers
///
/// A writer persists the final result of a run somewhere a person can
/// read it and returns the paths it wrote.
pub trait ReportWriter {
    /// Writes a crawl summary
    fn write_crawl(
        &self,
        report: &CrawlReport,
        stats: &CrawlStatistics,
    ) -> OutputResult<Vec<PathBuf>>;

    /// Writes a research report
    fn write_research(&self, report: &ResearchReport) -> OutputResult<Vec<PathBuf>>;
}
