/// Page state definitions for tracking crawl progress
///
/// A URL moves `Discovered -> Claimed -> Fetching -> {Parsed | FetchFailed | Skipped}`.
/// Claiming happens before any fetch is dispatched, which is what keeps two
/// members of the same batch from fetching the same page.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// URL sits in the frontier
    Discovered,

    /// URL was taken off the frontier and recorded as visited
    Claimed,

    /// Fetch is in flight
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and parsed into a `CrawledPage`
    Parsed,

    /// Fetch or parse failed; the URL still counts as visited
    FetchFailed,

    /// URL was rejected by the filter or the content policy
    Skipped,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Parsed | Self::FetchFailed | Self::Skipped)
    }

    /// Returns true if the page produced content
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Parsed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// `Skipped` is reachable from the two states in which the URL is
    /// inspected (`Discovered` before claiming, `Fetching` when the content
    /// policy rejects the response).
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Claimed)
                | (Self::Discovered, Self::Skipped)
                | (Self::Claimed, Self::Fetching)
                | (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetching, Self::Skipped)
        )
    }

    /// Converts the page state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Claimed => "claimed",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::FetchFailed => "fetch_failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a page state from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "claimed" => Some(Self::Claimed),
            "fetching" => Some(Self::Fetching),
            "parsed" => Some(Self::Parsed),
            "fetch_failed" => Some(Self::FetchFailed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> [Self; 6] {
        [
            Self::Discovered,
            Self::Claimed,
            Self::Fetching,
            Self::Parsed,
            Self::FetchFailed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
