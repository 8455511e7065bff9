//! DuckDuckGo search engine implementation.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::{element_text, fetch_html, first_text, http_client, selector};
use crate::{Engine, EngineConfig, Result, SearchResult};

/// DuckDuckGo search engine, scraping the no-JavaScript HTML endpoint.
pub struct DuckDuckGo {
    config: EngineConfig,
    client: Client,
}

impl DuckDuckGo {
    /// Creates a new DuckDuckGo engine.
    pub fn new() -> Self {
        let config = EngineConfig {
            name: "duckduckgo".to_string(),
            shortcut: "ddg".to_string(),
            ..Default::default()
        };
        Self {
            client: http_client(config.timeout),
            config,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.client = http_client(config.timeout);
        self.config = config;
        self
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for DuckDuckGo {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let html = fetch_html(&self.client, &url).await?;
        let results = parse_results(&html, max_results)?;
        debug!("DuckDuckGo returned {} results", results.len());
        Ok(results)
    }
}

fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result, .web-result")?;
    let title_selector = selector(".result__title a, h2 a, a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;
    let alt_snippet_selector = selector(".snippet")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }
        let Some(title_elem) = element.select(&title_selector).next() else {
            continue;
        };
        let title = element_text(title_elem);
        let href = title_elem.value().attr("href").unwrap_or_default();
        let snippet = first_text(element, &[&snippet_selector, &alt_snippet_selector]);

        if let Some(url) = normalize_link(href) {
            if !title.is_empty() {
                results.push(SearchResult::new(url, title, snippet));
            }
        }
    }

    if results.is_empty() {
        let fallback = selector(".links_main a.result__a")?;
        for anchor in document.select(&fallback).take(max_results) {
            let title = element_text(anchor);
            let href = anchor.value().attr("href").unwrap_or_default();
            if let Some(url) = normalize_link(href) {
                if !title.is_empty() {
                    results.push(SearchResult::new(url, title, ""));
                }
            }
        }
    }

    Ok(results)
}

/// Unwraps `duckduckgo.com/l/?uddg=` redirects and makes the link absolute.
fn normalize_link(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with("http") {
        href.to_string()
    } else if href.contains("duckduckgo.com") || href.starts_with('/') {
        format!("https://duckduckgo.com{}", href.trim_start_matches("duckduckgo.com"))
    } else {
        format!("https://{}", href)
    };

    if absolute.contains("duckduckgo.com/l/") {
        let parsed = Url::parse(&absolute).ok()?;
        let target = parsed.query_pairs().find(|(k, _)| k == "uddg")?.1.into_owned();
        return Some(target);
    }
    Some(absolute)
}
