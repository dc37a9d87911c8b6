use std::path::PathBuf;
use std::time::Duration;

/// Matches the desktop browser string the site expects; bare client UAs get
/// served error pages.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Settings shared by every sport scraper.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Directory the CSV cache tree lives under.
    pub cache_root: PathBuf,
    pub user_agent: String,
    /// Delay before every request to stats.ncaa.org.
    pub politeness: Duration,
    /// Retries for transient failures (timeouts, 429, 5xx).
    pub retries: u32,
    /// Base backoff, doubled per attempt.
    pub backoff: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let cache_root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ncaa_stats");
        Self {
            cache_root,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            politeness: Duration::from_secs(5),
            retries: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl ScrapeConfig {
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_politeness(mut self, delay: Duration) -> Self {
        self.politeness = delay;
        self
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root() {
        let config = ScrapeConfig::default();
        assert!(config.cache_root.ends_with(".ncaa_stats"));
        assert_eq!(config.politeness, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ScrapeConfig::default()
            .with_cache_root("/tmp/ncaa_test")
            .with_politeness(Duration::ZERO)
            .with_retries(0, Duration::ZERO);
        assert_eq!(config.cache_root, PathBuf::from("/tmp/ncaa_test"));
        assert_eq!(config.retries, 0);
    }
}
