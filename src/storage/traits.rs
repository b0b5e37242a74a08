//! Storage traits and error types

use crate::crawler::{CrawlReport, CrawledPage, PageFailure};
use crate::research::ResearchReport;
use crate::storage::{RunKind, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Run {id} is a {actual} run, expected {expected}")]
    WrongRunKind {
        id: i64,
        expected: RunKind,
        actual: RunKind,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of runs and their results
pub trait Storage {
    // ===== Run Management =====

    /// Records a new run in `running` state and returns its ID
    fn create_run(&mut self, kind: RunKind, subject: &str, config_hash: &str)
        -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Most recent run, optionally restricted to one kind
    fn get_latest_run(&self, kind: Option<RunKind>) -> StorageResult<Option<RunRecord>>;

    /// Sets a terminal status and the finish timestamp
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Crawl Results =====

    /// Stores every page and failure of a crawl in one transaction
    fn save_crawl_report(&mut self, run_id: i64, report: &CrawlReport) -> StorageResult<()>;

    fn load_crawled_pages(&self, run_id: i64) -> StorageResult<Vec<CrawledPage>>;

    fn load_crawl_failures(&self, run_id: i64) -> StorageResult<Vec<PageFailure>>;

    // ===== Research Results =====

    fn save_research_report(&mut self, run_id: i64, report: &ResearchReport)
        -> StorageResult<()>;

    fn load_research_report(&self, run_id: i64) -> StorageResult<Option<ResearchReport>>;
}
