//! Formatting of result sets and deep reads into markdown documents.

use serde::{Deserialize, Serialize};

use crate::document::{link, Document};
use crate::reader::DeepReadResult;
use crate::text::truncate_with_ellipsis;
use crate::SearchResult;

/// Configuration for the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Characters of content shown per result or sub-page.
    #[serde(default = "default_content_cap")]
    pub content_cap: usize,
}

fn default_content_cap() -> usize {
    1500
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            content_cap: default_content_cap(),
        }
    }
}

/// Renders search results and deep reads as structured text.
///
/// Formatting is pure and never fails; missing fields are left out.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Creates a new aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn cap(&self, content: &str) -> String {
        truncate_with_ellipsis(content, self.config.content_cap)
    }

    /// Full report: per result its source, engine, snippet and extracted content.
    pub fn format_results(&self, query: &str, results: &[SearchResult]) -> String {
        let mut doc = Document::new();
        doc.heading(1, format!("Search Results for: {}", query));

        if results.is_empty() {
            doc.note("No results found");
        }

        for (i, result) in results.iter().enumerate() {
            doc.heading(2, format!("{}. {}", i + 1, result.title))
                .field("Source", &result.url);
            if !result.engine.is_empty() {
                doc.field("Engine", &result.engine);
            }
            if !result.snippet.is_empty() {
                doc.field("Snippet", &result.snippet);
            }
            if let Some(content) = result.content.as_deref().filter(|c| !c.is_empty()) {
                doc.section("Extracted Content", self.cap(content));
            }
            doc.rule();
        }

        doc.render()
    }

    /// Compact listing with title, URL and snippet only.
    pub fn format_basic(&self, results: &[SearchResult]) -> String {
        let mut doc = Document::new();
        for (i, result) in results.iter().enumerate() {
            doc.heading(3, format!("Result {}", i + 1))
                .field("Title", &result.title)
                .field("URL", &result.url)
                .field("Snippet", &result.snippet);
        }
        doc.render()
    }

    /// Listing with extracted content, falling back to the snippet.
    pub fn format_with_content(&self, results: &[SearchResult]) -> String {
        let mut doc = Document::new();
        for (i, result) in results.iter().enumerate() {
            doc.heading(3, format!("Result {}", i + 1))
                .field("Title", &result.title)
                .field("URL", &result.url);
            match result.content.as_deref().filter(|c| !c.is_empty()) {
                Some(content) => doc.section("Content", self.cap(content)),
                None => doc.field("Snippet", &result.snippet),
            };
        }
        doc.render()
    }

    /// Seed page, then one entry per crawled sub-page, then crawl counts.
    pub fn format_deep_read(&self, result: &DeepReadResult) -> String {
        let mut doc = Document::new();
        doc.heading(1, link(&result.seed_title, &result.seed_url))
            .text(&result.seed_content)
            .rule();

        if !result.sub_pages.is_empty() {
            doc.heading(2, "Related Pages");
            for (i, page) in result.sub_pages.iter().enumerate() {
                doc.heading(3, format!("{}. {}", i + 1, link(&page.link_text, &page.url)));
                match &page.error {
                    Some(error) => {
                        doc.note(format!("Error: {}", error));
                    }
                    None => {
                        if !page.title.is_empty() && page.title != page.link_text {
                            doc.quote(&page.title);
                        }
                        doc.text(self.cap(&page.content)).rule();
                    }
                }
            }
        }

        doc.note(format!(
            "Crawled {} of {} total links",
            result.links_crawled, result.total_links_found
        ));
        doc.render()
    }
}
