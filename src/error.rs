//! Error types for the web search library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search, enrichment and deep reading.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Page could not be rendered or had no readable content.
    #[error("Failed to render page: {0}")]
    Render(String),

    /// Headless browser failure.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Time budget exceeded.
    #[error("Search timeout exceeded")]
    Timeout,

    /// No registered engine matches the selection.
    #[error("No search engine available")]
    NoEngineAvailable,

    /// The selected engine and every fallback failed.
    #[error("All search engines failed: {0}")]
    AllEnginesFailed(String),

    /// Every engine in a multi-engine search failed or returned nothing.
    #[error("No results from any search engine")]
    NoResults,

    /// Invalid query or options.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Whether retrying the same request might succeed: timeouts, connection
    /// failures, HTTP 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Timeout => true,
            SearchError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|status| {
                        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                    })
            }
            _ => false,
        }
    }
}
