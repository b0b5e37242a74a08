//! Site crawler
//!
//! This module contains the crawl orchestration, including:
//! - The FIFO frontier of discovered URLs
//! - SEO signal extraction from fetched HTML
//! - The batch loop with claiming, per-page timeouts and fail-fast

mod coordinator;
mod frontier;
mod page;
mod parser;

pub use coordinator::{CrawlOrchestrator, CrawlSettings};
pub use frontier::Frontier;
pub use page::{
    CrawlReport, CrawlState, CrawledPage, ImageDescriptor, OpenGraph, PageFailure, SemanticFlags,
};
pub use parser::parse_page;
