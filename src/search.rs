//! Search orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, AggregatorConfig};
use crate::enricher::{Enricher, EnricherConfig};
use crate::options::{DEFAULT_DEEP_SEARCH_TIMEOUT, DEFAULT_SEARCH_TIMEOUT};
use crate::reader::{DeepReadResult, DeepReader, DeepReaderConfig};
use crate::renderer::{HtmlRenderer, PageRenderer};
use crate::{Engine, EngineRegistry, Result, SearchError, SearchOptions, SearchResult};

/// Budget for [`Search::search_and_aggregate`].
pub const AGGREGATE_TIMEOUT: Duration = Duration::from_secs(45);

/// Search front end over an engine registry and a page renderer.
///
/// Cheap to clone; the registry and renderer are shared read-only between
/// concurrent requests.
#[derive(Clone)]
pub struct Search {
    registry: Arc<EngineRegistry>,
    renderer: Arc<dyn PageRenderer>,
    enricher: Enricher,
    aggregator: Aggregator,
    reader: DeepReader,
}

impl Search {
    /// Creates a search over `registry`, rendering pages with `renderer`.
    pub fn new(registry: EngineRegistry, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            registry: Arc::new(registry),
            enricher: Enricher::new(Arc::clone(&renderer)),
            reader: DeepReader::new(Arc::clone(&renderer)),
            aggregator: Aggregator::new(),
            renderer,
        }
    }

    /// Built-in engines and a plain HTTP renderer.
    pub fn with_defaults() -> Result<Self> {
        let renderer: Arc<dyn PageRenderer> = Arc::new(HtmlRenderer::http()?);
        Ok(Self::new(EngineRegistry::with_defaults(), renderer))
    }

    /// Replaces the content enrichment settings.
    pub fn with_enricher_config(mut self, config: EnricherConfig) -> Self {
        self.enricher = Enricher::with_config(Arc::clone(&self.renderer), config);
        self
    }

    /// Replaces the deep reader settings.
    pub fn with_reader_config(mut self, config: DeepReaderConfig) -> Self {
        self.reader = DeepReader::with_config(Arc::clone(&self.renderer), config);
        self
    }

    /// Replaces the formatter settings.
    pub fn with_aggregator_config(mut self, config: AggregatorConfig) -> Self {
        self.aggregator = Aggregator::with_config(config);
        self
    }

    /// Returns the engine registry.
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Returns the formatter.
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Searches one engine, falling back through the default priority
    /// order if it fails.
    ///
    /// Results are tagged with the engine that produced them. With
    /// `extract_content` set, page content is attached before returning.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        validate(query, options)?;
        let budget = options.timeout_or(DEFAULT_SEARCH_TIMEOUT);
        let start = Instant::now();

        let results = timeout(budget, self.search_inner(query, options))
            .await
            .map_err(|_| SearchError::Timeout)??;

        info!(
            "Search '{}' returned {} results in {}ms",
            query,
            results.len(),
            start.elapsed().as_millis()
        );
        Ok(results)
    }

    async fn search_inner(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let primary = self
            .registry
            .select(&options.engines)
            .ok_or(SearchError::NoEngineAvailable)?;

        let mut results = match run_engine(&primary, query, options.max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Engine {} failed: {}, trying fallbacks", primary.name(), e);
                self.fallback(query, options.max_results, primary.name(), e).await?
            }
        };

        if options.extract_content && !results.is_empty() {
            self.enricher.enrich(&mut results).await;
        }
        Ok(results)
    }

    async fn fallback(
        &self,
        query: &str,
        max_results: usize,
        failed: &str,
        mut last_err: SearchError,
    ) -> Result<Vec<SearchResult>> {
        for engine in self.registry.fallback_chain(failed) {
            match run_engine(&engine, query, max_results).await {
                Ok(results) => {
                    debug!("Fallback engine {} succeeded", engine.name());
                    return Ok(results);
                }
                Err(e) => {
                    warn!("Fallback engine {} failed: {}", engine.name(), e);
                    last_err = e;
                }
            }
        }
        Err(SearchError::AllEnginesFailed(last_err.to_string()))
    }

    /// Queries several engines concurrently and concatenates their results
    /// in engine order.
    ///
    /// Each engine is asked for `max(1, max_results / engines)` results. A
    /// failing engine is skipped; if none returns anything the call fails
    /// with [`SearchError::NoResults`]. Content is extracted when
    /// `extract_content` is set, then the list is cut to `max_results`.
    pub async fn deep_search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        validate(query, options)?;
        let budget = options.timeout_or(DEFAULT_DEEP_SEARCH_TIMEOUT);
        let start = Instant::now();

        let results = timeout(budget, self.deep_search_inner(query, options))
            .await
            .map_err(|_| SearchError::Timeout)??;

        info!(
            "Deep search '{}' returned {} results in {}ms",
            query,
            results.len(),
            start.elapsed().as_millis()
        );
        Ok(results)
    }

    async fn deep_search_inner(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let engines = self.registry.resolve(&options.engines);
        if engines.is_empty() {
            return Err(SearchError::NoEngineAvailable);
        }

        let per_engine = (options.max_results / engines.len()).max(1);
        debug!("Searching {} engines, {} results each", engines.len(), per_engine);

        let mut tasks = JoinSet::new();
        for (idx, engine) in engines.iter().enumerate() {
            let engine = Arc::clone(engine);
            let query = query.to_string();
            tasks.spawn(async move {
                let outcome = run_engine(&engine, &query, per_engine).await;
                (idx, outcome)
            });
        }

        let mut slots: Vec<Vec<SearchResult>> = vec![Vec::new(); engines.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(results))) => {
                    debug!("Engine {} returned {} results", engines[idx].name(), results.len());
                    slots[idx] = results;
                }
                Ok((idx, Err(e))) => warn!("Engine {} failed: {}", engines[idx].name(), e),
                Err(e) => warn!("Engine task failed: {}", e),
            }
        }

        let mut results: Vec<SearchResult> = slots.into_iter().flatten().collect();
        if results.is_empty() {
            return Err(SearchError::NoResults);
        }

        if options.extract_content {
            self.enricher.enrich(&mut results).await;
        }
        results.truncate(options.max_results);
        Ok(results)
    }

    /// Single-engine search with content extraction, formatted as one
    /// markdown document.
    pub async fn search_and_aggregate(&self, query: &str, max_results: usize) -> Result<String> {
        let options = SearchOptions::new()
            .with_max_results(max_results)
            .with_content(true)
            .with_timeout(AGGREGATE_TIMEOUT);
        let results = self.search(query, &options).await?;
        Ok(self.aggregator.format_results(query, &results))
    }

    /// Reads `url` and crawls its most relevant links.
    pub async fn deep_read(&self, url: &str) -> Result<DeepReadResult> {
        self.reader.read(url).await
    }

    /// Renders one page as markdown.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let page = self.renderer.extract(url).await?;
        Ok(page.to_markdown())
    }
}

fn validate(query: &str, options: &SearchOptions) -> Result<()> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
    }
    if options.max_results == 0 {
        return Err(SearchError::InvalidQuery("max_results must be at least 1".into()));
    }
    Ok(())
}

/// Runs one engine under its own timeout and tags its results.
async fn run_engine(engine: &Arc<dyn Engine>, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let budget = Duration::from_secs(engine.config().timeout);
    let results = timeout(budget, engine.search(query, max_results))
        .await
        .map_err(|_| SearchError::Timeout)??;

    let name = engine.name();
    Ok(results
        .into_iter()
        .take(max_results)
        .map(|r| r.with_engine(name))
        .collect())
}
