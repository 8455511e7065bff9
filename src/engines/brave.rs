//! Brave search engine implementation.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{element_text, fetch_html, first_text, http_client, selector};
use crate::{Engine, EngineConfig, Result, SearchResult};

/// Brave search engine.
pub struct Brave {
    config: EngineConfig,
    client: Client,
}

impl Brave {
    /// Creates a new Brave engine.
    pub fn new() -> Self {
        let config = EngineConfig {
            name: "brave".to_string(),
            shortcut: "br".to_string(),
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

impl Default for Brave {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for Brave {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = format!(
            "https://search.brave.com/search?q={}",
            urlencoding::encode(query)
        );
        let html = fetch_html(&self.client, &url).await?;
        let results = parse_results(&html, max_results)?;
        debug!("Brave returned {} results", results.len());
        Ok(results)
    }
}

fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_selector = selector(r#"div.snippet[data-type="web"], .result-card, article[data-type="web"]"#)?;
    let title_selector =
        selector(r#".search-snippet-title, .snippet-title, .title, [data-testid="result-title"]"#)?;
    let url_selector = selector(r#"a[href^="http"]"#)?;
    let desc_selector = selector(".generic-snippet .content, .snippet-description")?;
    let testid_desc = selector(r#"[data-testid="result-description"]"#)?;
    let desc = selector(".desc")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }
        let Some(link) = element.select(&url_selector).next() else {
            continue;
        };
        let url = link.value().attr("href").unwrap_or_default().trim();

        let mut title = first_text(element, &[&title_selector]);
        if title.is_empty() {
            title = element_text(link);
        }
        let snippet = first_text(element, &[&desc_selector, &testid_desc, &desc]);

        if !url.is_empty() && !title.is_empty() {
            results.push(SearchResult::new(url, title, snippet));
        }
    }

    if results.is_empty() {
        let fallback = selector(r#"#results a[href^="http"]"#)?;
        for link in document.select(&fallback) {
            if results.len() >= max_results {
                break;
            }
            let title = element_text(link);
            let url = link.value().attr("href").unwrap_or_default().trim();
            if !title.is_empty() {
                results.push(SearchResult::new(url, title, ""));
            }
        }
    }

    Ok(results)
}
