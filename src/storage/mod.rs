//! Storage module for persisting runs and their results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking for crawls and research (status, timestamps, config hash)
//! - Crawled pages and failures of each crawl
//! - Final research reports

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::ScoutError;
use std::fmt;
use std::path::Path;

/// Opens (creating if needed) the database at `path`
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScoutError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::new(path)
}

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Crawl,
    Research,
}

impl RunKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Research => "research",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "crawl" => Some(Self::Crawl),
            "research" => Some(Self::Research),
            _ => None,
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Represents a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub kind: RunKind,
    /// Seed URL or research topic
    pub subject: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub error_message: Option<String>,
}
