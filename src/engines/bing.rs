//! Bing search engine implementation.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{element_text, fetch_html, first_text, http_client, selector};
use crate::{Engine, EngineConfig, Result, SearchResult};

/// Bing web search.
pub struct Bing {
    config: EngineConfig,
    client: Client,
}

impl Bing {
    /// Creates a new Bing engine.
    pub fn new() -> Self {
        let config = EngineConfig {
            name: "bing".to_string(),
            shortcut: "bi".to_string(),
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

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for Bing {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = format!("https://www.bing.com/search?q={}", urlencoding::encode(query));
        let html = fetch_html(&self.client, &url).await?;
        let results = parse_results(&html, max_results)?;
        debug!("Bing returned {} results", results.len());
        Ok(results)
    }
}

fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector("li.b_algo, div.b_algo")?;
    let heading_link = selector("h2 a")?;
    let any_link = selector("a[href]")?;
    let caption_p = selector(".b_caption p")?;
    let caption = selector(".b_caption")?;
    let paragraph = selector("p")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }
        let Some(link) = element
            .select(&heading_link)
            .next()
            .or_else(|| element.select(&any_link).next())
        else {
            continue;
        };
        let title = element_text(link);
        let url = link.value().attr("href").unwrap_or_default().trim();
        let snippet = first_text(element, &[&caption_p, &caption, &paragraph]);

        if !url.is_empty() && !title.is_empty() {
            results.push(SearchResult::new(url, title, snippet));
        }
    }

    if results.is_empty() {
        let fallback = selector("#b_results h2 a")?;
        for link in document.select(&fallback).take(max_results) {
            let title = element_text(link);
            let url = link.value().attr("href").unwrap_or_default().trim();
            if !url.is_empty() && !title.is_empty() {
                results.push(SearchResult::new(url, title, ""));
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bing_new() {
        let engine = Bing::new();
        assert_eq!(engine.name(), "bing");
        assert_eq!(engine.shortcut(), "bi");
        assert!(engine.is_enabled());
    }

    #[test]
    fn test_bing_default() {
        assert_eq!(Bing::default().name(), "bing");
    }

    #[test]
    fn test_parse_results() {
        let html = r#"
            <ol id="b_results">
                <li class="b_algo">
                    <h2><a href="https://www.rust-lang.org/">Rust Programming Language</a></h2>
                    <div class="b_caption"><p>A language empowering everyone.</p></div>
                </li>
                <li class="b_algo">
                    <h2><a href="https://en.wikipedia.org/wiki/Rust">Rust - Wikipedia</a></h2>
                    <div class="b_caption">Caption without paragraph</div>
                </li>
                <li class="b_algo"><h2><a href="">Empty</a></h2></li>
            </ol>
        "#;
        let results = parse_results(html, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(results[0].snippet, "A language empowering everyone.");
        assert_eq!(results[1].snippet, "Caption without paragraph");
    }

    #[test]
    fn test_parse_results_caps_at_max() {
        let item = r#"<li class="b_algo"><h2><a href="https://a.com">A</a></h2></li>"#;
        let html = format!("<ol id=\"b_results\">{}</ol>", item.repeat(5));
        assert_eq!(parse_results(&html, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_results_heading_fallback() {
        let html = r#"<div id="b_results"><h2><a href="https://b.com">Only heading</a></h2></div>"#;
        let results = parse_results(html, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://b.com");
        assert!(results[0].snippet.is_empty());
    }

    #[test]
    fn test_parse_results_empty_html() {
        assert!(parse_results("<html></html>", 10).unwrap().is_empty());
    }
}
