//! Offline end-to-end tests: mock engines and a mock renderer driven through
//! the public API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

use a3s_websearch::{
    DeepReaderConfig, Engine, EngineConfig, EngineRegistry, EnricherConfig, Link, LinkedPage,
    PageRenderer, RenderedPage, Result, Search, SearchError, SearchOptions, SearchResult,
};

struct FixedEngine {
    config: EngineConfig,
    count: usize,
    requested: AtomicUsize,
}

impl FixedEngine {
    fn new(name: &str, count: usize) -> Self {
        Self {
            config: EngineConfig {
                name: name.to_string(),
                shortcut: name[..2].to_string(),
                ..Default::default()
            },
            count,
            requested: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Engine for FixedEngine {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.requested.store(max_results, Ordering::SeqCst);
        Ok((0..self.count.min(max_results))
            .map(|i| {
                SearchResult::new(
                    format!("https://{}.example/{}", self.config.name, i),
                    format!("{} #{} from {}", query, i, self.config.name),
                    "snippet",
                )
            })
            .collect())
    }
}

struct BrokenEngine {
    config: EngineConfig,
}

impl BrokenEngine {
    fn new(name: &str) -> Self {
        Self {
            config: EngineConfig {
                name: name.to_string(),
                shortcut: name[..2].to_string(),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl Engine for BrokenEngine {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        Err(SearchError::Parse("unexpected markup".to_string()))
    }
}

/// A tiny in-memory website.
#[derive(Default)]
struct Website {
    pages: HashMap<String, LinkedPage>,
}

impl Website {
    fn with_page(mut self, url: &str, title: &str, text: &str, links: Vec<Link>) -> Self {
        self.pages.insert(
            url.to_string(),
            LinkedPage {
                title: title.to_string(),
                text: text.to_string(),
                links,
            },
        );
        self
    }
}

#[async_trait]
impl PageRenderer for Website {
    async fn extract(&self, url: &str) -> Result<RenderedPage> {
        let page = self.extract_links_and_content(url).await?;
        Ok(RenderedPage {
            title: page.title,
            text: page.text,
        })
    }

    async fn extract_links_and_content(&self, url: &str) -> Result<LinkedPage> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        match self.pages.get(url) {
            Some(page) => Ok(page.clone()),
            None if url.contains(".example/") => Ok(LinkedPage {
                title: url.to_string(),
                text: format!("Article text for {}.", url),
                links: Vec::new(),
            }),
            None => Err(SearchError::Render(format!("{} not found", url))),
        }
    }
}

fn registry(engines: Vec<Arc<dyn Engine>>) -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    for engine in engines {
        registry.register_arc(engine);
    }
    registry
}

#[tokio::test]
async fn iphone_deep_search_returns_capped_enriched_results() {
    let engines: Vec<Arc<FixedEngine>> = ["duckduckgo", "bing", "brave"]
        .iter()
        .map(|name| Arc::new(FixedEngine::new(name, 2)))
        .collect();
    let search = Search::new(
        registry(engines.iter().map(|e| e.clone() as Arc<dyn Engine>).collect()),
        Arc::new(Website::default()),
    );

    let options = SearchOptions::new().with_max_results(3).with_content(true);
    let results = assert_ok!(search.deep_search("iPhone 17", &options).await);

    assert_eq!(results.len(), 3);
    assert!(engines.iter().all(|e| e.requested.load(Ordering::SeqCst) == 1));
    let sources: Vec<&str> = results.iter().map(|r| r.engine.as_str()).collect();
    assert_eq!(sources, vec!["duckduckgo", "bing", "brave"]);
    for result in &results {
        assert!(result.content.is_some());
        assert!(result.extracted_at.is_some());
    }
}

#[tokio::test]
async fn deep_search_length_is_min_of_cap_and_available() {
    let search = Search::new(
        registry(vec![
            Arc::new(FixedEngine::new("duckduckgo", 10)),
            Arc::new(FixedEngine::new("bing", 10)),
        ]),
        Arc::new(Website::default()),
    );

    for max in [1, 2, 5, 9] {
        let options = SearchOptions::new().with_max_results(max);
        let results = assert_ok!(search.deep_search("rust", &options).await);
        let per_engine = (max / 2).max(1);
        assert_eq!(results.len(), max.min(per_engine * 2));
    }
}

#[tokio::test]
async fn all_engines_failing() {
    let search = Search::new(
        registry(vec![
            Arc::new(BrokenEngine::new("duckduckgo")),
            Arc::new(BrokenEngine::new("bing")),
            Arc::new(BrokenEngine::new("brave")),
        ]),
        Arc::new(Website::default()),
    );
    let options = SearchOptions::new();

    let err = assert_err!(search.search("rust", &options).await);
    assert!(matches!(err, SearchError::AllEnginesFailed(_)));

    let err = assert_err!(search.deep_search("rust", &options).await);
    assert!(matches!(err, SearchError::NoResults));
}

#[tokio::test]
async fn fallback_results_carry_fallback_engine_name() {
    let search = Search::new(
        registry(vec![
            Arc::new(BrokenEngine::new("bing")),
            Arc::new(FixedEngine::new("duckduckgo", 2)),
            Arc::new(FixedEngine::new("brave", 2)),
        ]),
        Arc::new(Website::default()),
    );
    let options = SearchOptions::new().with_engines(["bing"]);
    let results = assert_ok!(search.search("rust", &options).await);
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.engine == "duckduckgo"));
}

#[tokio::test]
async fn enrichment_tolerates_failing_pages() {
    struct MixedEngine(EngineConfig);

    #[async_trait]
    impl Engine for MixedEngine {
        fn config(&self) -> &EngineConfig {
            &self.0
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            Ok(vec![
                SearchResult::new("https://a.example/1", "ok", ""),
                SearchResult::new("https://offline.test/1", "broken", ""),
                SearchResult::new("https://a.example/2", "ok", ""),
                SearchResult::new("https://offline.test/2", "broken", ""),
            ])
        }
    }

    let engine = MixedEngine(EngineConfig {
        name: "duckduckgo".to_string(),
        ..Default::default()
    });
    let search = Search::new(registry(vec![Arc::new(engine)]), Arc::new(Website::default()))
        .with_enricher_config(EnricherConfig {
            concurrency: 3,
            ..Default::default()
        });

    let options = SearchOptions::new().with_content(true);
    let results = assert_ok!(search.search("rust", &options).await);

    assert_eq!(results.len(), 4);
    let enriched: Vec<bool> = results.iter().map(|r| r.is_enriched()).collect();
    assert_eq!(enriched, vec![true, false, true, false]);
    assert!(results[1].extracted_at.is_none());
}

fn blog() -> Website {
    Website::default()
        .with_page(
            "https://blog.test/",
            "Blog",
            "Latest posts on the blog.",
            vec![
                Link::new("/login", "Sign In"),
                Link::new("/a1", "Interesting Long Article Title"),
                Link::new("/a1", "Duplicate anchor for the same article"),
                Link::new("/a2", "Another article"),
                Link::new("/dead", "A link to a page that is gone"),
                Link::new("/files/report.pdf", "Annual report download"),
                Link::new("https://elsewhere.test/x", "Off-site story"),
                Link::new("mailto:me@blog.test", "Email me"),
                Link::new("/more", "more"),
            ],
        )
        .with_page("https://blog.test/a1", "Article One", "First article body.", vec![])
        .with_page("https://blog.test/a2", "Article Two", "Second article body.", vec![])
}

#[tokio::test]
async fn deep_read_filters_crawls_and_formats() {
    let search = Search::new(EngineRegistry::new(), Arc::new(blog()));
    let result = assert_ok!(search.deep_read("https://blog.test/").await);

    assert_eq!(result.total_links_found, 9);
    assert_eq!(result.links_crawled, result.sub_pages.len());
    assert!(result.links_crawled <= result.total_links_found);

    let crawled: Vec<&str> = result.sub_pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        crawled,
        vec![
            "https://blog.test/a1",
            "https://blog.test/dead",
            "https://blog.test/a2",
        ]
    );
    assert_eq!(result.sub_pages[0].link_text, "Interesting Long Article Title");
    assert!(result.sub_pages[1].error.is_some());

    let doc = search.aggregator().format_deep_read(&result);
    assert!(doc.starts_with("# [Blog](https://blog.test/)"));
    assert!(doc.contains("> Article One"));
    assert!(doc.contains("*Error: "));
    assert!(doc.ends_with("*Crawled 3 of 9 total links*\n"));
}

#[tokio::test]
async fn deep_read_any_domain_and_link_cap() {
    let config = DeepReaderConfig::default()
        .with_same_domain(false)
        .with_max_links(100);
    assert_eq!(config.max_links, 10);

    let search = Search::new(EngineRegistry::new(), Arc::new(blog())).with_reader_config(config);
    let result = assert_ok!(search.deep_read("https://blog.test/").await);
    assert!(result.sub_pages.iter().any(|p| p.url == "https://elsewhere.test/x"));
    assert_eq!(result.links_crawled, 4);
}

#[tokio::test]
async fn deep_read_unrenderable_seed_fails() {
    let search = Search::new(EngineRegistry::new(), Arc::new(Website::default()));
    let err = assert_err!(search.deep_read("https://offline.test/").await);
    assert!(matches!(err, SearchError::Render(_)));
}

#[tokio::test]
async fn search_and_aggregate_document() {
    let search = Search::new(
        registry(vec![Arc::new(FixedEngine::new("duckduckgo", 2))]),
        Arc::new(Website::default()),
    );
    let doc = assert_ok!(search.search_and_aggregate("rust", 2).await);
    assert!(doc.starts_with("# Search Results for: rust\n"));
    assert!(doc.contains("## 1. rust #0 from duckduckgo"));
    assert!(doc.contains("**Extracted Content:**\nArticle text for https://duckduckgo.example/0."));
    assert_eq!(doc.matches("\n---\n").count(), 2);
}
