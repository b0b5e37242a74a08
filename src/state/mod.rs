//! State module for tracking crawl and research progress
//!
//! # Components
//!
//! - `PageState`: per-URL state machine (discovered, claimed, fetching, parsed, ...)
//! - `VisitedSet`: claim-once set of canonical URLs shared by a whole run

mod page_state;
mod visited;

// Re-export main types
pub use page_state::PageState;
pub use visited::VisitedSet;
