//! Recursive deep research
//!
//! Turns a topic into a sourced Markdown report by alternating web search,
//! page fetching and learning extraction, descending into follow-up
//! questions until the depth budget is spent.

mod learnings;
mod orchestrator;
mod queries;
mod report;
mod search;

pub use learnings::{
    check_content, dedup_learnings, extract_learnings, extraction_prompt, ContentRejection,
    Extraction,
};
pub use orchestrator::{
    follow_up_topic, ResearchContext, ResearchOrchestrator, ResearchResult, ResearchSettings,
};
pub use queries::{fallback_queries, generate_queries, query_prompt, GeneratedQueries, ResearchQuery};
pub use report::{
    assemble_report, no_findings_message, synthesis_prompt, ResearchParameters, ResearchReport,
    ResearchStatus, ResearchTiming,
};
pub use search::{HttpSearchEngine, SearchEngine, SearchError, SearchHit};
