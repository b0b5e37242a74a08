//! robots.txt parsing on top of the `robotstxt` matcher

use robotstxt::DefaultMatcher;

/// Largest `Crawl-delay` honored, in seconds
pub const MAX_CRAWL_DELAY: f64 = 3600.0;

/// Parsed robots.txt for one origin
///
/// Matching is delegated to `robotstxt`; only `Crawl-delay`, which that
/// crate does not expose, is parsed here.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Permissive rules used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks a URL (or bare path) against the rules for `agent`
    ///
    /// `agent` is the product token (`RankScout`), not the full
    /// user-agent header.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Returns the `Crawl-delay` for `agent`, preferring a group naming the
    /// agent over the `*` group
    ///
    /// Negative, non-finite and values above `MAX_CRAWL_DELAY` are ignored.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        if self.is_allow_all() {
            return None;
        }

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut wildcard = None;
        let mut specific = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_string());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Some(delay) = parse_delay(value) else {
                        continue;
                    };
                    if group.iter().any(|ua| agent_matches(ua, agent)) {
                        specific = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        specific.or(wildcard)
    }
}

fn parse_delay(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|delay| delay.is_finite() && (0.0..=MAX_CRAWL_DELAY).contains(delay))
}

/// Compares the product token of a `User-agent` value with `agent`
///
/// The token is the leading run of letters, `-` and `_`, so
/// `RankScout/1.0` names `RankScout`. An empty token matches nothing.
fn agent_matches(value: &str, agent: &str) -> bool {
    let token_len = value
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(value.len());
    let token = &value[..token_len];
    !token.is_empty() && token.eq_ignore_ascii_case(agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("/admin", "RankScout"));
        assert_eq!(robots.crawl_delay("RankScout"), None);
    }

    #[test]
    fn test_disallow_prefix() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed("https://example.com/", "RankScout"));
        assert!(!robots.is_allowed("https://example.com/admin/users", "RankScout"));
    }

    #[test]
    fn test_allow_overrides_longer_match() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(!robots.is_allowed("/private", "RankScout"));
        assert!(robots.is_allowed("/private/public", "RankScout"));
    }

    #[test]
    fn test_agent_specific_group() {
        let robots =
            ParsedRobots::from_content("User-agent: RankScout\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(!robots.is_allowed("/page", "RankScout"));
        assert!(robots.is_allowed("/page", "OtherBot"));
    }

    #[test]
    fn test_garbage_allows_everything() {
        let robots = ParsedRobots::from_content("<html>not robots</html>");
        assert!(robots.is_allowed("/any", "RankScout"));
    }

    #[test]
    fn test_crawl_delay_prefers_named_agent() {
        let robots = ParsedRobots::from_content(
            "User-agent: RankScout\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10",
        );
        assert_eq!(robots.crawl_delay("RankScout"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_shared_group_and_comments() {
        let robots = ParsedRobots::from_content(
            "User-agent: BotA\nUser-agent: BotB # both\nDisallow: /x\nCrawl-delay: 2.5",
        );
        assert_eq!(robots.crawl_delay("botb"), Some(2.5));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_ignores_unusable_values() {
        for value in ["inf", "-inf", "NaN", "1e300", "-5", "3601"] {
            let robots = ParsedRobots::from_content(&format!("User-agent: *\nCrawl-delay: {}", value));
            assert_eq!(robots.crawl_delay("RankScout"), None, "Crawl-delay: {}", value);
        }

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 3600");
        assert_eq!(robots.crawl_delay("RankScout"), Some(MAX_CRAWL_DELAY));
    }

    #[test]
    fn test_crawl_delay_matches_whole_product_token() {
        let robots = ParsedRobots::from_content(
            "User-agent: a\nCrawl-delay: 30\n\nUser-agent:\nCrawl-delay: 20\n\nUser-agent: *\nCrawl-delay: 1",
        );
        assert_eq!(robots.crawl_delay("RankScout"), Some(1.0));

        let robots = ParsedRobots::from_content("User-agent: rankscout/2.0\nCrawl-delay: 4");
        assert_eq!(robots.crawl_delay("RankScout"), Some(4.0));
        assert_eq!(robots.crawl_delay("Rank"), None);
    }
}
