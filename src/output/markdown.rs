//! Markdown rendering
//!
//! This module generates human-readable markdown for crawl results and
//! research reports.

use crate::crawler::CrawlReport;
use crate::output::stats::CrawlStatistics;
use crate::research::{ResearchReport, ResearchStatus};

/// How many failures the crawl summary lists before truncating
const MAX_LISTED_FAILURES: usize = 50;

/// Formats a crawl summary as markdown
pub fn format_crawl_summary(report: &CrawlReport, stats: &CrawlStatistics) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Crawl Summary: {}\n\n", report.seed_url));

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Pages Analyzed**: {}\n", report.total_pages));
    md.push_str(&format!(
        "- **URLs Visited**: {}\n",
        report.total_links_visited
    ));
    md.push_str(&format!(
        "- **URLs Remaining**: {}\n",
        report.remaining_urls.len()
    ));
    md.push_str(&format!(
        "- **Crawl Time**: {:.1} seconds\n",
        report.crawl_time_seconds
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.1}%\n\n",
        stats.success_rate()
    ));

    md.push_str("## SEO Issues\n\n");
    md.push_str("| Issue | Count |\n");
    md.push_str("|-------|-------|\n");
    for (label, count) in stats.issues() {
        md.push_str(&format!("| {} | {} |\n", label, count));
    }
    md.push('\n');

    md.push_str("## Links and Images\n\n");
    md.push_str(&format!(
        "- **Internal Links**: {}\n",
        stats.total_internal_links
    ));
    md.push_str(&format!(
        "- **External Links**: {}\n",
        stats.total_external_links
    ));
    md.push_str(&format!(
        "- **Average Links per Page**: {:.1}\n",
        stats.avg_links_per_page
    ));
    md.push_str(&format!(
        "- **Images**: {} ({} without alt, {} with empty alt)\n\n",
        stats.total_images, stats.images_missing_alt, stats.images_empty_alt
    ));

    if !report.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Title | H1 |\n");
        md.push_str("|-----|--------|-------|----|\n");
        for page in &report.pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                page.url,
                page.status_code,
                escape_cell(page.title.as_deref().unwrap_or("(missing)")),
                page.h1_tags.len()
            ));
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!("- {}: {}\n", failure.url, failure.reason));
        }
        if report.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}

/// Formats a research report as markdown
///
/// Completed reports already carry their sources and metadata sections;
/// a heading is added only when the narrative lacks one.
pub fn format_research_report(report: &ResearchReport) -> String {
    let mut md = String::new();

    match report.status {
        ResearchStatus::Completed => {
            if !report.report.trim_start().starts_with('#') {
                md.push_str(&format!("# Research: {}\n\n", report.topic));
            }
            md.push_str(report.report.trim_end());
            md.push('\n');
        }
        ResearchStatus::NoFindings => {
            md.push_str(&format!("# Research: {}\n\n", report.topic));
            md.push_str(report.report.trim_end());
            md.push_str("\n\n");
            md.push_str(&format!(
                "_Breadth {}, depth {}, {:.2} minutes._\n",
                report.parameters.breadth,
                report.parameters.depth,
                report.timing.duration_minutes
            ));
        }
    }

    md
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
