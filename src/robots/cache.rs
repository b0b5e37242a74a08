use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// robots.txt rules together with the time they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: ParsedRobots) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        Utc::now() - self.fetched_at > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry() {
        let cached = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cached.is_stale(Duration::hours(24)));
    }

    #[test]
    fn test_stale_entry() {
        let mut cached = CachedRobots::new(ParsedRobots::allow_all());
        cached.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cached.is_stale(Duration::hours(24)));
        assert!(!cached.is_stale(Duration::hours(48)));
    }
}
