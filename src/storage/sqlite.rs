//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{CrawlReport, CrawledPage, PageFailure};
use crate::research::{ResearchParameters, ResearchReport, ResearchStatus, ResearchTiming};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunKind, RunRecord, RunStatus};
use crate::ScoutError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, kind, subject, started_at, finished_at, config_hash, status, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and applies the schema
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn require_kind(&self, run_id: i64, expected: RunKind) -> StorageResult<()> {
        let run = self.get_run(run_id)?;
        if run.kind != expected {
            return Err(StorageError::WrongRunKind {
                id: run_id,
                expected,
                actual: run.kind,
            });
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let kind: String = row.get(1)?;
    let status: String = row.get(6)?;
    Ok(RunRecord {
        id: row.get(0)?,
        kind: RunKind::from_db_string(&kind).unwrap_or(RunKind::Crawl),
        subject: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Failed),
        error_message: row.get(7)?,
    })
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp {:?}: {}", value, e)))
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        kind: RunKind,
        subject: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (kind, subject, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                kind.to_db_string(),
                subject,
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, kind: Option<RunKind>) -> StorageResult<Option<RunRecord>> {
        let run = match kind {
            Some(kind) => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM runs WHERE kind = ?1 ORDER BY id DESC LIMIT 1",
                        RUN_COLUMNS
                    ),
                    params![kind.to_db_string()],
                    run_from_row,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                    [],
                    run_from_row,
                )
                .optional()?,
        };
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, error_message, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Crawl Results =====

    fn save_crawl_report(&mut self, run_id: i64, report: &CrawlReport) -> StorageResult<()> {
        self.require_kind(run_id, RunKind::Crawl)?;

        let tx = self.conn.transaction()?;
        {
            let mut insert_page = tx.prepare(
                "INSERT OR REPLACE INTO crawled_pages (run_id, url, status_code, title, crawled_at, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for page in &report.pages {
                insert_page.execute(params![
                    run_id,
                    page.url,
                    page.status_code,
                    page.title,
                    page.crawl_timestamp.to_rfc3339(),
                    serde_json::to_string(page)?,
                ])?;
            }

            let mut insert_failure = tx.prepare(
                "INSERT INTO crawl_failures (run_id, url, reason) VALUES (?1, ?2, ?3)",
            )?;
            for failure in &report.failures {
                insert_failure.execute(params![run_id, failure.url, failure.reason])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            "Saved {} pages and {} failures for run {}",
            report.pages.len(),
            report.failures.len(),
            run_id
        );
        Ok(())
    }

    fn load_crawled_pages(&self, run_id: i64) -> StorageResult<Vec<CrawledPage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM crawled_pages WHERE run_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![run_id], |row| row.get::<_, String>(0))?;

        let mut pages = Vec::new();
        for data in rows {
            pages.push(serde_json::from_str(&data?)?);
        }
        Ok(pages)
    }

    fn load_crawl_failures(&self, run_id: i64) -> StorageResult<Vec<PageFailure>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, reason FROM crawl_failures WHERE run_id = ?1 ORDER BY id")?;
        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(PageFailure {
                    url: row.get(0)?,
                    reason: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(failures)
    }

    // ===== Research Results =====

    fn save_research_report(
        &mut self,
        run_id: i64,
        report: &ResearchReport,
    ) -> StorageResult<()> {
        self.require_kind(run_id, RunKind::Research)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO research_reports
                (run_id, topic, breadth, depth, guidance, status, report, learnings, sources,
                 started_at, finished_at, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run_id,
                report.topic,
                report.parameters.breadth as i64,
                report.parameters.depth as i64,
                report.parameters.guidance,
                report.status.as_str(),
                report.report,
                serde_json::to_string(&report.learnings)?,
                serde_json::to_string(&report.sources)?,
                report.timing.start_time.to_rfc3339(),
                report.timing.end_time.to_rfc3339(),
                report.timing.duration_minutes,
            ],
        )?;
        Ok(())
    }

    fn load_research_report(&self, run_id: i64) -> StorageResult<Option<ResearchReport>> {
        let row = self
            .conn
            .query_row(
                "SELECT topic, breadth, depth, guidance, status, report, learnings, sources,
                        started_at, finished_at, duration_minutes
                 FROM research_reports WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, f64>(10)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            topic,
            breadth,
            depth,
            guidance,
            status,
            report,
            learnings,
            sources,
            started_at,
            finished_at,
            duration_minutes,
        )) = row
        else {
            return Ok(None);
        };

        let status = match status.as_str() {
            "completed" => ResearchStatus::Completed,
            "no_findings" => ResearchStatus::NoFindings,
            other => return Err(StorageError::Corrupt(format!("unknown status {:?}", other))),
        };

        Ok(Some(ResearchReport {
            topic,
            report,
            sources: serde_json::from_str(&sources)?,
            learnings: serde_json::from_str(&learnings)?,
            timing: ResearchTiming {
                start_time: parse_timestamp(&started_at)?,
                end_time: parse_timestamp(&finished_at)?,
                duration_minutes,
            },
            parameters: ResearchParameters {
                breadth: breadth as usize,
                depth: depth as usize,
                guidance,
            },
            status,
        }))
    }
}
