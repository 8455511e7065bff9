//! Search result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single search result.
///
/// Engines produce results without `content`; the enricher fills `content`
/// and `extracted_at` at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Absolute result URL.
    pub url: String,
    /// Short description returned by the engine.
    pub snippet: String,
    /// Extracted page content, if enrichment succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Name of the engine that produced this result.
    pub engine: String,
    /// When `content` was extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    /// Creates a new search result.
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            content: None,
            engine: String::new(),
            extracted_at: None,
        }
    }

    /// Sets the engine that returned this result.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Attaches extracted content and stamps the extraction time.
    ///
    /// Returns `false` without touching the result if content was already
    /// attached.
    pub fn attach_content(&mut self, content: impl Into<String>) -> bool {
        if self.content.is_some() {
            return false;
        }
        self.content = Some(content.into());
        self.extracted_at = Some(Utc::now());
        true
    }

    /// Returns whether content has been extracted for this result.
    pub fn is_enriched(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_new() {
        let result = SearchResult::new("https://example.com", "Title", "Snippet");
        assert_eq!(result.url, "https://example.com");
        assert_eq!(result.title, "Title");
        assert_eq!(result.snippet, "Snippet");
        assert!(result.content.is_none());
        assert!(result.extracted_at.is_none());
        assert!(result.engine.is_empty());
        assert!(!result.is_enriched());
    }

    #[test]
    fn test_search_result_with_engine() {
        let result = SearchResult::new("url", "title", "snippet").with_engine("bing");
        assert_eq!(result.engine, "bing");
    }

    #[test]
    fn test_attach_content_sets_timestamp() {
        let mut result = SearchResult::new("url", "title", "snippet");
        assert!(result.attach_content("Body text"));
        assert_eq!(result.content.as_deref(), Some("Body text"));
        assert!(result.extracted_at.is_some());
        assert!(result.is_enriched());
    }

    #[test]
    fn test_attach_content_only_once() {
        let mut result = SearchResult::new("url", "title", "snippet");
        result.attach_content("first");
        let stamped = result.extracted_at;
        assert!(!result.attach_content("second"));
        assert_eq!(result.content.as_deref(), Some("first"));
        assert_eq!(result.extracted_at, stamped);
    }

    #[test]
    fn test_search_result_serialization_skips_absent_content() {
        let result = SearchResult::new("https://example.com", "Title", "Snippet").with_engine("brave");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"url\":\"https://example.com\""));
        assert!(json.contains("\"engine\":\"brave\""));
        assert!(!json.contains("content"));
        assert!(!json.contains("extracted_at"));
    }

    #[test]
    fn test_search_result_deserialization_defaults() {
        let json = r#"{"title":"T","url":"https://a.com","snippet":"s","engine":"bing"}"#;
        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.title, "T");
        assert!(result.content.is_none());
        assert!(result.extracted_at.is_none());
    }
}
