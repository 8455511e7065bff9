//! # a3s-websearch
//!
//! Multi-engine web search with content extraction and deep reading.
//!
//! This library retrieves search-engine result pages and web pages, extracts
//! readable content and aggregates it into structured text, with support for:
//!
//! - Single-engine search with a deterministic fallback chain
//! - Concurrent multi-engine "deep search" with failure isolation
//! - Bounded-concurrency content enrichment that tolerates partial failure
//! - Deep reading: one seed page plus a filtered one-level crawl of its links
//! - Markdown formatting of result sets and deep reads
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_websearch::{Search, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = Search::with_defaults()?;
//!
//!     let options = SearchOptions::new().with_max_results(5).with_content(true);
//!     let results = search.deep_search("rust programming", &options).await?;
//!
//!     for result in &results {
//!         println!("{} [{}]: {}", result.title, result.engine, result.url);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod document;
mod engine;
mod enricher;
mod error;
mod fetcher;
mod link;
mod options;
mod reader;
mod registry;
mod renderer;
mod result;
mod search;

pub mod engines;
pub mod retry;
pub mod text;

#[cfg(feature = "headless")]
pub mod browser;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use document::{Block, Document};
pub use engine::{Engine, EngineConfig};
pub use enricher::{Enricher, EnricherConfig};
pub use error::{Result, SearchError};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use link::{Link, LinkFilter, LinkKind};
pub use options::{SearchOptions, DEFAULT_DEEP_SEARCH_TIMEOUT, DEFAULT_SEARCH_TIMEOUT};
pub use reader::{DeepReadResult, DeepReader, DeepReaderConfig, SubPageResult};
pub use registry::{EngineRegistry, DEFAULT_PRIORITY};
pub use renderer::{parse_page, HtmlRenderer, LinkedPage, PageRenderer, RenderedPage};
pub use result::SearchResult;
pub use search::{Search, AGGREGATE_TIMEOUT};
