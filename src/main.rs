//! RankScout main entry point
//!
//! This is the command-line interface for the RankScout SEO crawler and
//! research assistant.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rankscout::config::{
    default_config_with_hash, load_config_with_hash, validate_crawl_delay, Config,
};
use rankscout::crawler::{CrawlOrchestrator, CrawlSettings};
use rankscout::fetch::HttpPageFetcher;
use rankscout::generate::ChatCompletionsGenerator;
use rankscout::output::{
    crawl_json, load_latest_summary, print_run_summary, print_statistics, research_json,
    CrawlStatistics, FileReportWriter, OutputFormat, ReportWriter,
};
use rankscout::research::{HttpSearchEngine, ResearchOrchestrator, ResearchSettings};
use rankscout::storage::{open_storage, RunKind, RunStatus, SqliteStorage, Storage};
use rankscout::url::{canonicalize_url, ensure_scheme};
use rankscout::{CancellationFlag, RunOutcome, TracingProgress, UrlFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// RankScout: SEO site crawler and recursive web researcher
///
/// Crawls a site to audit its on-page SEO signals, or researches a topic by
/// searching the web, reading the results and synthesizing a sourced
/// report. Every run is recorded in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "rankscout")]
#[command(version)]
#[command(about = "SEO site crawler and recursive web researcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and audit its pages
    Crawl {
        /// Seed URL (https:// is assumed when no scheme is given)
        url: String,

        /// Maximum number of pages to visit
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum number of concurrent fetches
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Delay between batches in seconds
        #[arg(long)]
        delay: Option<f64>,

        /// Print the crawl result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Research a topic and write a report
    Research {
        /// Topic to research
        topic: String,

        /// Queries per level (1-10)
        #[arg(long)]
        breadth: Option<usize>,

        /// Levels of follow-up research (1-5)
        #[arg(long)]
        depth: Option<usize>,

        /// Extra instructions passed to every prompt
        #[arg(long)]
        guidance: Option<String>,

        /// Print the research result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the latest recorded run and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => default_config_with_hash(),
    };
    tracing::debug!("Configuration hash: {}", config_hash);

    match cli.command {
        Command::Crawl {
            url,
            max_pages,
            max_concurrent,
            delay,
            json,
        } => {
            let options = CrawlOptions {
                max_pages: max_pages.unwrap_or(config.crawler.max_pages),
                max_concurrent: max_concurrent.unwrap_or(config.crawler.max_concurrent),
                delay: delay.unwrap_or(config.crawler.crawl_delay),
                json,
            };
            handle_crawl(&config, &config_hash, &url, options).await
        }
        Command::Research {
            topic,
            breadth,
            depth,
            guidance,
            json,
        } => {
            let options = ResearchOptions {
                breadth: breadth.unwrap_or(config.research.breadth),
                depth: depth.unwrap_or(config.research.depth),
                guidance,
                json,
            };
            handle_research(&config, &config_hash, &topic, options).await
        }
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rankscout=info,warn"),
            1 => EnvFilter::new("rankscout=debug,info"),
            2 => EnvFilter::new("rankscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Progress sink whose flag is set on Ctrl-C
fn cancellable_progress() -> Arc<TracingProgress> {
    let flag = CancellationFlag::new();
    let handler_flag = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            handler_flag.cancel();
        }
    });
    Arc::new(TracingProgress::new(flag))
}

fn open_database(config: &Config) -> Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn report_writer(config: &Config) -> FileReportWriter {
    FileReportWriter::new(
        &config.output.report_dir,
        &[OutputFormat::Markdown, OutputFormat::Json],
    )
}

/// Converts a politeness delay in seconds, rejecting unusable values
fn delay_from_secs(seconds: f64) -> Result<Duration> {
    validate_crawl_delay(seconds)?;
    Ok(Duration::try_from_secs_f64(seconds)?)
}

struct CrawlOptions {
    max_pages: usize,
    max_concurrent: usize,
    delay: f64,
    json: bool,
}

/// Handles the crawl subcommand
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    seed: &str,
    options: CrawlOptions,
) -> Result<()> {
    let fetcher = Arc::new(
        HttpPageFetcher::new(&config.user_agent).context("failed to build HTTP client")?,
    );

    let mut delay = delay_from_secs(options.delay).context("invalid --delay")?;
    if let Some(robots) = fetcher.robots() {
        let seed_url = canonicalize_url(&ensure_scheme(seed))
            .with_context(|| format!("invalid seed URL {}", seed))?;
        if let Some(robots_delay) = robots.crawl_delay(&seed_url).await {
            let robots_delay =
                delay_from_secs(robots_delay).context("invalid robots.txt crawl-delay")?;
            if robots_delay > delay {
                tracing::info!(
                    "Using robots.txt crawl-delay of {:.1}s",
                    robots_delay.as_secs_f64()
                );
                delay = robots_delay;
            }
        }
    }

    let crawler = CrawlOrchestrator::new(
        fetcher,
        cancellable_progress(),
        CrawlSettings::from(&config.crawler),
    )
    .with_filter(UrlFilter::from_entries(&config.exclude));

    let mut storage = open_database(config)?;
    let run_id = storage.create_run(RunKind::Crawl, seed, config_hash)?;
    tracing::info!("Recording crawl as run #{}", run_id);

    let outcome = crawler
        .crawl(seed, options.max_pages, options.max_concurrent, delay)
        .await;

    let report = match outcome {
        Ok(RunOutcome::Completed(report)) => report,
        Ok(RunOutcome::Cancelled) => {
            storage.finish_run(run_id, RunStatus::Cancelled, None)?;
            println!("Crawl cancelled");
            return Ok(());
        }
        Err(e) => {
            storage.finish_run(run_id, RunStatus::Failed, Some(&e.to_string()))?;
            return Err(e).context("crawl failed");
        }
    };

    storage.save_crawl_report(run_id, &report)?;
    storage.finish_run(run_id, RunStatus::Completed, None)?;

    let stats = CrawlStatistics::from_report(&report);
    let written = report_writer(config).write_crawl(&report, &stats)?;

    if options.json {
        println!("{}", crawl_json(&report, &stats)?);
    } else {
        print_statistics(&stats);
        for path in written {
            println!("Report written to: {}", path.display());
        }
    }

    Ok(())
}

struct ResearchOptions {
    breadth: usize,
    depth: usize,
    guidance: Option<String>,
    json: bool,
}

/// Handles the research subcommand
async fn handle_research(
    config: &Config,
    config_hash: &str,
    topic: &str,
    options: ResearchOptions,
) -> Result<()> {
    let search = Arc::new(HttpSearchEngine::from_env(&config.search)?);
    let generator = Arc::new(ChatCompletionsGenerator::from_env(&config.generator)?);
    let fetcher = Arc::new(
        HttpPageFetcher::new(&config.user_agent).context("failed to build HTTP client")?,
    );

    let researcher = ResearchOrchestrator::new(
        search,
        fetcher,
        generator,
        cancellable_progress(),
        ResearchSettings::from(&config.research),
    )
    .with_filter(UrlFilter::from_entries(&config.exclude));

    let mut storage = open_database(config)?;
    let run_id = storage.create_run(RunKind::Research, topic, config_hash)?;
    tracing::info!("Recording research as run #{}", run_id);

    let outcome = researcher
        .research(
            topic,
            options.breadth,
            options.depth,
            options.guidance.as_deref(),
        )
        .await;

    let report = match outcome {
        Ok(RunOutcome::Completed(report)) => report,
        Ok(RunOutcome::Cancelled) => {
            storage.finish_run(run_id, RunStatus::Cancelled, None)?;
            println!("Research cancelled");
            return Ok(());
        }
        Err(e) => {
            storage.finish_run(run_id, RunStatus::Failed, Some(&e.to_string()))?;
            return Err(e).context("research failed");
        }
    };

    storage.save_research_report(run_id, &report)?;
    storage.finish_run(run_id, RunStatus::Completed, None)?;

    let written = report_writer(config).write_research(&report)?;

    if options.json {
        println!("{}", research_json(&report)?);
    } else {
        println!("{}", report.report);
        println!();
        for path in written {
            println!("Report written to: {}", path.display());
        }
    }

    Ok(())
}

/// Handles the stats subcommand: shows the latest run from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    match load_latest_summary(&storage, None)? {
        Some(summary) => print_run_summary(&summary),
        None => println!("No runs recorded yet"),
    }

    Ok(())
}
