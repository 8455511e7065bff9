//! Bounded-concurrency content enrichment.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::renderer::PageRenderer;
use crate::text::summarize;
use crate::SearchResult;

/// Configuration for the content enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnricherConfig {
    /// Maximum number of pages rendered at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Time allowed for a single page.
    #[serde(default = "default_item_timeout")]
    pub item_timeout: Duration,
    /// Characters of content stored per result.
    #[serde(default = "default_content_limit")]
    pub content_limit: usize,
}

fn default_concurrency() -> usize {
    2
}

fn default_item_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_content_limit() -> usize {
    3000
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            item_timeout: default_item_timeout(),
            content_limit: default_content_limit(),
        }
    }
}

/// Fills `content` on search results by rendering their pages.
///
/// One task per result, admitted through a semaphore sized to
/// `concurrency`. A failed or timed-out page leaves its result untouched;
/// enrichment itself never fails.
#[derive(Clone)]
pub struct Enricher {
    renderer: Arc<dyn PageRenderer>,
    config: EnricherConfig,
}

impl Enricher {
    /// Creates an enricher with default configuration.
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self::with_config(renderer, EnricherConfig::default())
    }

    /// Creates an enricher with the given configuration.
    pub fn with_config(renderer: Arc<dyn PageRenderer>, config: EnricherConfig) -> Self {
        Self { renderer, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// Enriches `results` in place and returns how many gained content.
    ///
    /// Results that already carry content are skipped. Each completed page
    /// is written to its slot as soon as it finishes, so if the caller drops
    /// this future (e.g. on an outer timeout) finished work is kept and all
    /// outstanding renders are aborted.
    pub async fn enrich(&self, results: &mut [SearchResult]) -> usize {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, result) in results.iter().enumerate() {
            if result.is_enriched() {
                continue;
            }
            let renderer = Arc::clone(&self.renderer);
            let semaphore = Arc::clone(&semaphore);
            let url = result.url.clone();
            let item_timeout = self.config.item_timeout;
            let limit = self.config.content_limit;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, None);
                };
                match timeout(item_timeout, renderer.extract(&url)).await {
                    Ok(Ok(page)) => (idx, Some(summarize(&page.text, limit))),
                    Ok(Err(e)) => {
                        warn!("Content extraction failed for {}: {}", url, e);
                        (idx, None)
                    }
                    Err(_) => {
                        warn!("Content extraction timed out for {}", url);
                        (idx, None)
                    }
                }
            });
        }

        let mut enriched = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Some(content))) => {
                    if results[idx].attach_content(content) {
                        enriched += 1;
                    }
                }
                Ok((_, None)) => {}
                Err(e) => warn!("Enrichment task failed: {}", e),
            }
        }

        debug!("Enriched {}/{} results", enriched, results.len());
        enriched
    }
}
