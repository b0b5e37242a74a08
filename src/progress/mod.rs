//! Progress reporting and cooperative cancellation
//!
//! Both orchestrators take a `ProgressSink` at construction. They emit
//! structured events through it and poll it for cancellation before every
//! unit of work (each crawl batch, each research query, each recursive
//! descent). Callers that do not care pass [`NoopProgress`].

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Structured progress event emitted by the orchestrators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    CrawlStarted {
        seed_url: String,
        max_pages: usize,
        max_concurrent: usize,
    },

    /// Emitted after every crawl batch
    CrawlBatch {
        percent_complete: f64,
        pages_analyzed: usize,
        total_links_known: usize,
        current_url: Option<String>,
        new_links_found: usize,
    },

    CrawlFinished {
        pages_analyzed: usize,
        visited: usize,
        remaining: usize,
        elapsed_seconds: f64,
    },

    ResearchStarted {
        topic: String,
        breadth: usize,
        depth: usize,
    },

    QueriesGenerated {
        depth: usize,
        queries: Vec<String>,
        fallback: bool,
    },

    /// A query is about to be processed
    QueryStarted {
        depth: usize,
        index: usize,
        total: usize,
        query: String,
    },

    SourceAnalyzed {
        url: String,
        learnings: usize,
        follow_up_questions: usize,
    },

    SourceSkipped {
        url: String,
        reason: String,
    },

    /// A recursive descent is about to start
    Descending {
        depth: usize,
        breadth: usize,
        topic: String,
    },

    SynthesisStarted {
        learnings: usize,
        sources: usize,
    },

    ResearchFinished {
        learnings: usize,
        sources: usize,
        duration_minutes: f64,
    },
}

impl ProgressEvent {
    /// Returns the event's type tag as it appears in serialized form
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CrawlStarted { .. } => "crawl_started",
            Self::CrawlBatch { .. } => "crawl_batch",
            Self::CrawlFinished { .. } => "crawl_finished",
            Self::ResearchStarted { .. } => "research_started",
            Self::QueriesGenerated { .. } => "queries_generated",
            Self::QueryStarted { .. } => "query_started",
            Self::SourceAnalyzed { .. } => "source_analyzed",
            Self::SourceSkipped { .. } => "source_skipped",
            Self::Descending { .. } => "descending",
            Self::SynthesisStarted { .. } => "synthesis_started",
            Self::ResearchFinished { .. } => "research_finished",
        }
    }
}

/// Receiver of progress events with a cancellation check
///
/// Implementations must not block: both methods are called from inside the
/// orchestrator loops.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);

    fn is_cancelled(&self) -> bool;
}

/// Shared cancellation flag
///
/// Clones share the same underlying flag, so one clone can be handed to a
/// signal handler while another sits inside a sink.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sink that drops every event and is never cancelled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: &ProgressEvent) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Sink that logs events through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingProgress {
    flag: CancellationFlag,
}

impl TracingProgress {
    pub fn new(flag: CancellationFlag) -> Self {
        Self { flag }
    }

    pub fn flag(&self) -> &CancellationFlag {
        &self.flag
    }
}

impl ProgressSink for TracingProgress {
    fn emit(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::CrawlBatch {
                percent_complete,
                pages_analyzed,
                total_links_known,
                new_links_found,
                ..
            } => {
                tracing::info!(
                    "Crawl progress: {:.1}% ({} pages, {} links known, {} new)",
                    percent_complete,
                    pages_analyzed,
                    total_links_known,
                    new_links_found
                );
            }
            ProgressEvent::QueryStarted {
                depth,
                index,
                total,
                query,
            } => {
                tracing::info!("[depth {}] Query {}/{}: {}", depth, index + 1, total, query);
            }
            ProgressEvent::SourceSkipped { url, reason } => {
                tracing::debug!("Skipped {}: {}", url, reason);
            }
            other => match serde_json::to_string(other) {
                Ok(json) => tracing::info!(event = other.event_type(), "{}", json),
                Err(_) => tracing::info!(event = other.event_type(), "progress"),
            },
        }
    }

    fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn emit(&self, event: &ProgressEvent) {
        (**self).emit(event)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_clones_share_state() {
        let flag = CancellationFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_tracing_progress_follows_flag() {
        let flag = CancellationFlag::new();
        let sink = TracingProgress::new(flag.clone());
        assert!(!sink.is_cancelled());
        flag.cancel();
        assert!(sink.is_cancelled());
    }

    #[test]
    fn test_noop_never_cancelled() {
        let sink = NoopProgress;
        sink.emit(&ProgressEvent::SynthesisStarted {
            learnings: 0,
            sources: 0,
        });
        assert!(!sink.is_cancelled());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ProgressEvent::CrawlBatch {
            percent_complete: 50.0,
            pages_analyzed: 5,
            total_links_known: 12,
            current_url: Some("https://example.com/a".to_string()),
            new_links_found: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "crawl_batch");
        assert_eq!(json["pages_analyzed"], 5);
        assert_eq!(event.event_type(), "crawl_batch");
    }
}
