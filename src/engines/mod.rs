//! Search engine implementations.

mod bing;
mod brave;
mod duckduckgo;

pub use bing::Bing;
pub use brave::Brave;
pub use duckduckgo::DuckDuckGo;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::fetcher::USER_AGENT;
use crate::{Result, SearchError};

/// Builds the HTTP client shared by an engine's requests.
///
/// Falls back to a default client if the configured one cannot be built.
pub(crate) fn http_client(timeout_secs: u64) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build engine HTTP client, using defaults: {}", e);
            Client::new()
        })
}

/// GETs a results page, failing on non-success status.
pub(crate) async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))
}

/// Trimmed text of the first element matching any of `selectors`, in order.
pub(crate) fn first_text(element: ElementRef<'_>, selectors: &[&Selector]) -> String {
    selectors
        .iter()
        .filter_map(|s| element.select(s).next())
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
