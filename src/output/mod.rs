//! Output module for crawl summaries and research reports
//!
//! This module handles:
//! - Rendering crawl summaries and research reports as markdown
//! - Exporting run results as JSON
//! - Computing on-page SEO statistics for a crawl
//! - Summarizing the latest stored run

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_crawl_summary, format_research_report};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputFormat, OutputResult, ReportWriter};

use crate::crawler::CrawlReport;
use crate::research::ResearchReport;
use crate::storage::{RunKind, RunRecord, Storage};
use crate::ScoutError;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes markdown and/or JSON files into a report directory
///
/// File names are `<kind>-<slug>-<timestamp>.<ext>`, where the slug is
/// derived from the seed URL or topic.
pub struct FileReportWriter {
    dir: PathBuf,
    formats: Vec<OutputFormat>,
}

impl FileReportWriter {
    pub fn new(dir: impl Into<PathBuf>, formats: &[OutputFormat]) -> Self {
        Self {
            dir: dir.into(),
            formats: formats.to_vec(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_all(
        &self,
        kind: &str,
        subject: &str,
        markdown: impl FnOnce() -> String,
        json: impl FnOnce() -> OutputResult<String>,
    ) -> OutputResult<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let stem = format!(
            "{}-{}-{}",
            kind,
            slugify(subject),
            Utc::now().format("%Y%m%d-%H%M%S")
        );

        let mut markdown = Some(markdown);
        let mut json = Some(json);
        let mut written = Vec::new();

        for format in &self.formats {
            let contents = match format {
                OutputFormat::Markdown => match markdown.take() {
                    Some(render) => render(),
                    None => continue,
                },
                OutputFormat::Json => match json.take() {
                    Some(render) => render()?,
                    None => continue,
                },
            };
            let path = self.dir.join(format!("{}.{}", stem, format.extension()));
            fs::write(&path, contents)?;
            tracing::info!("Wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

impl ReportWriter for FileReportWriter {
    fn write_crawl(
        &self,
        report: &CrawlReport,
        stats: &CrawlStatistics,
    ) -> OutputResult<Vec<PathBuf>> {
        self.write_all(
            "crawl",
            &report.seed_url,
            || format_crawl_summary(report, stats),
            || crawl_json(report, stats),
        )
    }

    fn write_research(&self, report: &ResearchReport) -> OutputResult<Vec<PathBuf>> {
        self.write_all(
            "research",
            &report.topic,
            || format_research_report(report),
            || research_json(report),
        )
    }
}

#[derive(Serialize)]
struct CrawlExport<'a> {
    #[serde(flatten)]
    report: &'a CrawlReport,
    statistics: &'a CrawlStatistics,
}

/// Serializes a crawl report and its statistics as pretty JSON
pub fn crawl_json(report: &CrawlReport, stats: &CrawlStatistics) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(&CrawlExport {
        report,
        statistics: stats,
    })?)
}

/// Serializes a research report as pretty JSON
pub fn research_json(report: &ResearchReport) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Lowercase ASCII alphanumerics joined by single dashes, at most 60 chars
pub fn slugify(subject: &str) -> String {
    let trimmed = subject
        .trim_start_matches("https://")
        .trim_start_matches("http://");

    let mut slug = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= 60 {
            break;
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// The latest run and whatever results it stored
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run: RunRecord,
    pub duration_seconds: Option<i64>,
    pub crawl: Option<(CrawlReport, CrawlStatistics)>,
    pub research: Option<ResearchReport>,
}

/// Loads the latest run (optionally of one kind) from storage
///
/// Returns `Ok(None)` when nothing has been recorded yet.
pub fn load_latest_summary(
    storage: &dyn Storage,
    kind: Option<RunKind>,
) -> Result<Option<RunSummary>, ScoutError> {
    let Some(run) = storage.get_latest_run(kind)? else {
        return Ok(None);
    };

    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<chrono::DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds()),
        _ => None,
    };

    let mut summary = RunSummary {
        duration_seconds,
        crawl: None,
        research: None,
        run,
    };

    match summary.run.kind {
        RunKind::Crawl => {
            let pages = storage.load_crawled_pages(summary.run.id)?;
            let failures = storage.load_crawl_failures(summary.run.id)?;
            let stats = CrawlStatistics::from_pages(&pages, &failures);
            let report = CrawlReport {
                seed_url: summary.run.subject.clone(),
                total_pages: pages.len(),
                total_links_visited: pages.len() + failures.len(),
                crawl_time_seconds: summary.duration_seconds.unwrap_or(0) as f64,
                visited_urls: pages
                    .iter()
                    .map(|p| p.url.clone())
                    .chain(failures.iter().map(|f| f.url.clone()))
                    .collect(),
                remaining_urls: Vec::new(),
                pages,
                failures,
            };
            summary.crawl = Some((report, stats));
        }
        RunKind::Research => {
            summary.research = storage.load_research_report(summary.run.id)?;
        }
    }

    Ok(Some(summary))
}

/// Prints a stored run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("Run #{} ({})", summary.run.id, summary.run.kind);
    println!("  Subject: {}", summary.run.subject);
    println!("  Status: {}", summary.run.status);
    println!("  Started: {}", summary.run.started_at);
    if let Some(finished) = &summary.run.finished_at {
        println!("  Finished: {}", finished);
    }
    if let Some(seconds) = summary.duration_seconds {
        println!("  Duration: {} seconds", seconds);
    }
    if let Some(error) = &summary.run.error_message {
        println!("  Error: {}", error);
    }
    println!("  Config Hash: {}", summary.run.config_hash);
    println!();

    if let Some((_, stats)) = &summary.crawl {
        print_statistics(stats);
    }
    if let Some(report) = &summary.research {
        println!("=== Research ===\n");
        println!("  Status: {}", report.status.as_str());
        println!("  Breadth/Depth: {}/{}", report.parameters.breadth, report.parameters.depth);
        println!("  Learnings: {}", report.learnings.len());
        println!("  Sources: {}", report.sources.len());
    }
}
