//! Search options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Budget applied to single-engine searches when none is given.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget applied to multi-engine searches when none is given.
pub const DEFAULT_DEEP_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for a single search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Whether to fetch and attach page content to each result.
    #[serde(default)]
    pub extract_content: bool,
    /// Engines to use, by name, in order. Empty means the default order.
    #[serde(default)]
    pub engines: Vec<String>,
    /// Overall time budget. `None` uses the operation's default.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

fn default_max_results() -> usize {
    10
}

impl SearchOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self {
            max_results: default_max_results(),
            extract_content: false,
            engines: Vec::new(),
            timeout: None,
        }
    }

    /// Sets the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Enables or disables content extraction.
    pub fn with_content(mut self, extract: bool) -> Self {
        self.extract_content = extract;
        self
    }

    /// Sets the engines to use, in priority order.
    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the overall time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured budget or `fallback`.
    pub fn timeout_or(&self, fallback: Duration) -> Duration {
        self.timeout.unwrap_or(fallback)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_new() {
        let options = SearchOptions::new();
        assert_eq!(options.max_results, 10);
        assert!(!options.extract_content);
        assert!(options.engines.is_empty());
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_search_options_builder_chain() {
        let options = SearchOptions::new()
            .with_max_results(3)
            .with_content(true)
            .with_engines(["brave", "bing"])
            .with_timeout(Duration::from_secs(5));

        assert_eq!(options.max_results, 3);
        assert!(options.extract_content);
        assert_eq!(options.engines, vec!["brave", "bing"]);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_timeout_or() {
        let options = SearchOptions::new();
        assert_eq!(options.timeout_or(DEFAULT_SEARCH_TIMEOUT), Duration::from_secs(30));

        let options = options.with_timeout(Duration::from_secs(2));
        assert_eq!(options.timeout_or(DEFAULT_DEEP_SEARCH_TIMEOUT), Duration::from_secs(2));
    }

    #[test]
    fn test_search_options_deserialization_defaults() {
        let options: SearchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, SearchOptions::default());
    }
}
