//! Recursive research loop
//!
//! One level of research:
//! 1. Generates up to `breadth` queries (falling back to defaults)
//! 2. For each query: searches, claims unseen result URLs, fetches them,
//!    applies the content window and extracts learnings
//! 3. When `depth > 1`, descends once per query into its follow-up
//!    questions with a halved breadth
//!
//! All levels share one `ResearchContext`, borrowed mutably down the call
//! tree. Levels run sequentially, so the context has a single writer at any
//! time and a URL is claimed exactly once per run.

use crate::config::{validate_breadth, validate_depth, ResearchConfig};
use crate::fetch::{FetchOptions, PageFetcher};
use crate::generate::TextGenerator;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::research::learnings::{check_content, dedup_learnings, extract_learnings};
use crate::research::queries::{generate_queries, ResearchQuery};
use crate::research::report::{
    assemble_report, learnings_digest, no_findings_message, synthesize, ResearchParameters,
    ResearchReport, ResearchStatus, ResearchTiming,
};
use crate::research::search::SearchEngine;
use crate::state::VisitedSet;
use crate::url::{canonicalize, UrlFilter};
use crate::{Result, RunOutcome, ScoutError};
use chrono::Utc;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Policy values for a research run
#[derive(Debug, Clone)]
pub struct ResearchSettings {
    pub results_per_query: usize,
    pub min_content_chars: usize,
    pub max_content_chars: usize,
    pub max_learnings_per_page: usize,
    pub min_child_breadth: usize,
    pub fetch_timeout: Duration,
}

impl From<&ResearchConfig> for ResearchSettings {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            results_per_query: config.results_per_query,
            min_content_chars: config.min_content_chars,
            max_content_chars: config.max_content_chars,
            max_learnings_per_page: config.max_learnings_per_page,
            min_child_breadth: config.min_child_breadth,
            fetch_timeout: Duration::from_secs(config.fetch_timeout),
        }
    }
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self::from(&ResearchConfig::default())
    }
}

/// Accumulators shared by every level of one research run
#[derive(Debug, Clone, Default)]
pub struct ResearchContext {
    /// URLs a fetch was attempted for
    pub claimed: VisitedSet,
    /// URLs whose content passed the content window
    pub sources: VisitedSet,
    /// Learnings from every level, deduplicated after each level
    pub learnings: Vec<String>,
}

impl ResearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from learnings and visited URLs of earlier research
    pub fn with_prior<L, U>(learnings: L, visited_urls: U) -> Self
    where
        L: IntoIterator<Item = String>,
        U: IntoIterator<Item = String>,
    {
        let sources: VisitedSet = visited_urls.into_iter().collect();
        Self {
            claimed: sources.clone(),
            sources,
            learnings: dedup_learnings(learnings.into_iter().collect()),
        }
    }
}

/// What one level (including its descendants) produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchResult {
    pub learnings: Vec<String>,
    pub visited_urls: Vec<String>,
}

impl ResearchResult {
    fn merge(&mut self, child: ResearchResult) {
        self.learnings.extend(child.learnings);
        self.visited_urls.extend(child.visited_urls);
    }
}

/// What one query produced
#[derive(Debug, Default)]
struct QueryOutcome {
    learnings: Vec<String>,
    follow_up_questions: Vec<String>,
    sources: Vec<String>,
}

/// Depth/breadth-bounded recursive researcher
pub struct ResearchOrchestrator {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn PageFetcher>,
    generator: Arc<dyn TextGenerator>,
    progress: Arc<dyn ProgressSink>,
    filter: UrlFilter,
    settings: ResearchSettings,
}

impl ResearchOrchestrator {
    pub fn new(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn TextGenerator>,
        progress: Arc<dyn ProgressSink>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            search,
            fetcher,
            generator,
            progress,
            filter: UrlFilter::default(),
            settings,
        }
    }

    pub fn with_filter(mut self, filter: UrlFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Researches a topic and synthesizes the final report
    ///
    /// Breadth must be in `1..=10` and depth in `1..=5`. Cancellation at
    /// any point yields `RunOutcome::Cancelled` without calling synthesis.
    /// With no learnings, the report is [`no_findings_message`] and the
    /// generator is not asked to write one.
    pub async fn research(
        &self,
        topic: &str,
        breadth: usize,
        depth: usize,
        guidance: Option<&str>,
    ) -> Result<RunOutcome<ResearchReport>> {
        RunOutcome::from_result(self.run(topic, breadth, depth, guidance).await)
    }

    /// Runs the recursive part only, threading a caller-owned context
    ///
    /// Nothing is synthesized. The returned result holds what this call
    /// found; `ctx` holds everything including prior state.
    pub async fn research_with_context(
        &self,
        topic: &str,
        breadth: usize,
        depth: usize,
        guidance: Option<&str>,
        ctx: &mut ResearchContext,
    ) -> Result<RunOutcome<ResearchResult>> {
        let result = match validate_bounds(topic, breadth, depth) {
            Ok(()) => {
                self.explore(topic.to_string(), breadth, depth, guidance, ctx)
                    .await
            }
            Err(e) => Err(e),
        };
        RunOutcome::from_result(result)
    }

    async fn run(
        &self,
        topic: &str,
        breadth: usize,
        depth: usize,
        guidance: Option<&str>,
    ) -> Result<ResearchReport> {
        validate_bounds(topic, breadth, depth)?;
        let topic = topic.trim();
        let start_time = Utc::now();

        tracing::info!(
            "Starting research on {:?} (breadth {}, depth {})",
            topic,
            breadth,
            depth
        );
        self.progress.emit(&ProgressEvent::ResearchStarted {
            topic: topic.to_string(),
            breadth,
            depth,
        });

        let mut ctx = ResearchContext::new();
        self.explore(topic.to_string(), breadth, depth, guidance, &mut ctx)
            .await?;

        let learnings = dedup_learnings(ctx.learnings);
        let sources = ctx.sources.into_vec();
        let parameters = ResearchParameters {
            breadth,
            depth,
            guidance: guidance.map(str::to_string),
        };

        let (report, status) = if learnings.is_empty() {
            tracing::warn!("Research on {:?} produced no learnings", topic);
            (no_findings_message(topic), ResearchStatus::NoFindings)
        } else {
            if self.progress.is_cancelled() {
                return Err(ScoutError::Cancelled);
            }
            self.progress.emit(&ProgressEvent::SynthesisStarted {
                learnings: learnings.len(),
                sources: sources.len(),
            });

            let narrative =
                match synthesize(self.generator.as_ref(), topic, &learnings, &sources, guidance)
                    .await
                {
                    Ok(narrative) => narrative,
                    Err(e) => {
                        tracing::warn!("Report synthesis failed ({}), listing learnings instead", e);
                        learnings_digest(topic, &learnings)
                    }
                };

            let timing = ResearchTiming::between(start_time, Utc::now());
            let report = assemble_report(
                &narrative,
                topic,
                &sources,
                learnings.len(),
                &parameters,
                &timing,
            );
            (report, ResearchStatus::Completed)
        };

        let timing = ResearchTiming::between(start_time, Utc::now());
        tracing::info!(
            "Research on {:?} finished: {} learnings from {} sources in {:.2} minutes",
            topic,
            learnings.len(),
            sources.len(),
            timing.duration_minutes
        );
        self.progress.emit(&ProgressEvent::ResearchFinished {
            learnings: learnings.len(),
            sources: sources.len(),
            duration_minutes: timing.duration_minutes,
        });

        Ok(ResearchReport {
            topic: topic.to_string(),
            report,
            sources,
            learnings,
            timing,
            parameters,
            status,
        })
    }

    /// One level of research; recursion goes through a boxed future
    fn explore<'a>(
        &'a self,
        topic: String,
        breadth: usize,
        depth: usize,
        guidance: Option<&'a str>,
        ctx: &'a mut ResearchContext,
    ) -> BoxFuture<'a, Result<ResearchResult>> {
        Box::pin(async move {
            let mut result = ResearchResult::default();
            if depth == 0 {
                return Ok(result);
            }

            if self.progress.is_cancelled() {
                return Err(ScoutError::Cancelled);
            }

            let generated = generate_queries(
                self.generator.as_ref(),
                &topic,
                breadth,
                &ctx.learnings,
                guidance,
            )
            .await;
            self.progress.emit(&ProgressEvent::QueriesGenerated {
                depth,
                queries: generated.queries.iter().map(|q| q.query.clone()).collect(),
                fallback: generated.fallback,
            });

            let total = generated.queries.len();
            for (index, query) in generated.queries.iter().enumerate() {
                if self.progress.is_cancelled() {
                    tracing::info!("Research cancelled before query {:?}", query.query);
                    return Err(ScoutError::Cancelled);
                }
                self.progress.emit(&ProgressEvent::QueryStarted {
                    depth,
                    index,
                    total,
                    query: query.query.clone(),
                });

                let outcome = self.process_query(&topic, query, guidance, ctx).await;
                result.learnings.extend(outcome.learnings);
                result.visited_urls.extend(outcome.sources);

                if depth > 1 && !outcome.follow_up_questions.is_empty() {
                    if self.progress.is_cancelled() {
                        return Err(ScoutError::Cancelled);
                    }

                    let child_breadth = (breadth / 2).max(self.settings.min_child_breadth);
                    let child_topic = follow_up_topic(query, &outcome.follow_up_questions);
                    tracing::debug!(
                        "Descending to depth {} with breadth {}",
                        depth - 1,
                        child_breadth
                    );
                    self.progress.emit(&ProgressEvent::Descending {
                        depth: depth - 1,
                        breadth: child_breadth,
                        topic: child_topic.clone(),
                    });

                    let child = self
                        .explore(child_topic, child_breadth, depth - 1, guidance, ctx)
                        .await?;
                    result.merge(child);
                }
            }

            ctx.learnings = dedup_learnings(std::mem::take(&mut ctx.learnings));
            result.learnings = dedup_learnings(result.learnings);
            Ok(result)
        })
    }

    /// Searches one query and analyzes its unseen results
    ///
    /// Every failure in here is logged and swallowed.
    async fn process_query(
        &self,
        topic: &str,
        query: &ResearchQuery,
        guidance: Option<&str>,
        ctx: &mut ResearchContext,
    ) -> QueryOutcome {
        let mut outcome = QueryOutcome::default();

        let hits = match self
            .search
            .search(&query.query, self.settings.results_per_query)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Search for {:?} failed: {}", query.query, e);
                return outcome;
            }
        };

        let options = FetchOptions {
            timeout: self.settings.fetch_timeout,
            use_cache: true,
            only_main_content: true,
        };

        for hit in hits.into_iter().take(self.settings.results_per_query) {
            let url = canonicalize(&hit.url);
            if !self.filter.should_process(&url) {
                self.skip(&url, "filtered");
                continue;
            }
            // Claiming is the only visited check, so a URL is fetched once
            if !ctx.claimed.claim(&url) {
                tracing::debug!("Already visited {}", url);
                continue;
            }

            let fetched = match tokio::time::timeout(
                self.settings.fetch_timeout,
                self.fetcher.fetch(&url, &options),
            )
            .await
            {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    self.skip(&url, &e.to_string());
                    continue;
                }
                Err(_) => {
                    self.skip(&url, "timed out");
                    continue;
                }
            };

            if let Err(rejection) = check_content(
                &fetched.text,
                self.settings.min_content_chars,
                self.settings.max_content_chars,
            ) {
                self.skip(&url, &rejection.to_string());
                continue;
            }

            ctx.sources.claim(&url);
            outcome.sources.push(url.clone());

            let extraction = match extract_learnings(
                self.generator.as_ref(),
                topic,
                &query.query,
                &fetched.text,
                guidance,
                self.settings.max_learnings_per_page,
            )
            .await
            {
                Ok(extraction) => extraction,
                Err(e) => {
                    tracing::warn!("Learning extraction failed for {}: {}", url, e);
                    continue;
                }
            };

            self.progress.emit(&ProgressEvent::SourceAnalyzed {
                url: url.clone(),
                learnings: extraction.learnings.len(),
                follow_up_questions: extraction.follow_up_questions.len(),
            });

            ctx.learnings.extend(extraction.learnings.iter().cloned());
            outcome.learnings.extend(extraction.learnings);
            outcome
                .follow_up_questions
                .extend(extraction.follow_up_questions);
        }

        outcome
    }

    fn skip(&self, url: &str, reason: &str) {
        tracing::debug!("Skipping {}: {}", url, reason);
        self.progress.emit(&ProgressEvent::SourceSkipped {
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }
}

fn validate_bounds(topic: &str, breadth: usize, depth: usize) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(ScoutError::InvalidInput("topic must not be empty".into()));
    }
    validate_breadth(breadth).map_err(|e| ScoutError::InvalidInput(e.to_string()))?;
    validate_depth(depth).map_err(|e| ScoutError::InvalidInput(e.to_string()))?;
    Ok(())
}

/// Topic for a descent: the query's goal followed by its follow-up questions
pub fn follow_up_topic(query: &ResearchQuery, follow_up_questions: &[String]) -> String {
    let goal = if query.research_goal.trim().is_empty() {
        query.query.as_str()
    } else {
        query.research_goal.as_str()
    };
    format!(
        "Previous research goal: {}\nFollow-up research directions: {}",
        goal.trim(),
        follow_up_questions.join("\n")
    )
}
