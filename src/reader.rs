//! Deep reading: one seed page plus a crawl of its best outbound links.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::link::{Link, LinkFilter};
use crate::renderer::PageRenderer;
use crate::text::{summarize, truncate_with_ellipsis};
use crate::{Result, SearchError};

const DEFAULT_MAX_LINKS: usize = 10;
const MAX_LINKS_LIMIT: usize = 20;

/// Configuration for [`DeepReader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepReaderConfig {
    /// Maximum number of sub-pages crawled (1..=20).
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    /// Only follow links on the seed's host.
    #[serde(default = "default_same_domain")]
    pub same_domain: bool,
    /// Characters kept per page.
    #[serde(default = "default_content_limit")]
    pub content_limit: usize,
    /// Time allowed for each sub-page.
    #[serde(default = "default_sub_page_timeout")]
    pub sub_page_timeout: Duration,
    /// Sub-pages fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Budget for the whole deep read.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_max_links() -> usize {
    DEFAULT_MAX_LINKS
}

fn default_same_domain() -> bool {
    true
}

fn default_content_limit() -> usize {
    2000
}

fn default_sub_page_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_concurrency() -> usize {
    3
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for DeepReaderConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
            same_domain: default_same_domain(),
            content_limit: default_content_limit(),
            sub_page_timeout: default_sub_page_timeout(),
            concurrency: default_concurrency(),
            timeout: default_timeout(),
        }
    }
}

impl DeepReaderConfig {
    /// Sets the link cap. Values outside 1..=20 fall back to 10.
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self.clamped()
    }

    /// Sets whether only same-host links are followed.
    pub fn with_same_domain(mut self, same_domain: bool) -> Self {
        self.same_domain = same_domain;
        self
    }

    /// Sets the overall budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn clamped(mut self) -> Self {
        if !(1..=MAX_LINKS_LIMIT).contains(&self.max_links) {
            debug!("max_links {} out of range, using {}", self.max_links, DEFAULT_MAX_LINKS);
            self.max_links = DEFAULT_MAX_LINKS;
        }
        self
    }
}

/// Outcome of crawling one sub-page.
///
/// Exactly one of `content` and `error` is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubPageResult {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Anchor text of the link on the seed page.
    pub link_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubPageResult {
    fn failed(link: &Link, error: impl Into<String>) -> Self {
        Self {
            url: link.url.clone(),
            link_text: link.text.clone(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Returns whether the sub-page was read successfully.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A seed page and the sub-pages crawled from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepReadResult {
    pub seed_url: String,
    pub seed_title: String,
    pub seed_content: String,
    /// Crawled sub-pages, in link ranking order.
    pub sub_pages: Vec<SubPageResult>,
    /// Links found on the seed page before filtering.
    pub total_links_found: usize,
    /// Sub-pages attempted, successful or not.
    pub links_crawled: usize,
}

/// Reads a seed page and crawls a filtered set of its links one level deep.
#[derive(Clone)]
pub struct DeepReader {
    renderer: Arc<dyn PageRenderer>,
    config: DeepReaderConfig,
}

impl DeepReader {
    /// Creates a deep reader with default configuration.
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self::with_config(renderer, DeepReaderConfig::default())
    }

    /// Creates a deep reader; an out-of-range `max_links` is reset to 10.
    pub fn with_config(renderer: Arc<dyn PageRenderer>, config: DeepReaderConfig) -> Self {
        Self {
            renderer,
            config: config.clamped(),
        }
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &DeepReaderConfig {
        &self.config
    }

    /// Deep-reads `seed_url`.
    ///
    /// Fails only if the seed page cannot be rendered or the overall budget
    /// runs out; sub-page failures are recorded on their `SubPageResult`.
    pub async fn read(&self, seed_url: &str) -> Result<DeepReadResult> {
        timeout(self.config.timeout, self.read_inner(seed_url))
            .await
            .map_err(|_| SearchError::Timeout)?
    }

    async fn read_inner(&self, seed_url: &str) -> Result<DeepReadResult> {
        let seed = self
            .renderer
            .extract_links_and_content(seed_url)
            .await
            .map_err(|e| match e {
                SearchError::Render(msg) => SearchError::Render(msg),
                other => SearchError::Render(format!("{}: {}", seed_url, other)),
            })?;

        let candidates = LinkFilter::new(self.config.max_links, self.config.same_domain)
            .filter(seed_url, &seed.links);
        debug!(
            "Deep read {}: {} links found, {} selected",
            seed_url,
            seed.links.len(),
            candidates.len()
        );

        let sub_pages = self.crawl(candidates).await;
        let result = DeepReadResult {
            seed_url: seed_url.to_string(),
            seed_title: seed.title,
            seed_content: truncate_with_ellipsis(&seed.text, self.config.content_limit),
            total_links_found: seed.links.len(),
            links_crawled: sub_pages.len(),
            sub_pages,
        };

        info!(
            "Deep read {} crawled {}/{} links ({} ok)",
            seed_url,
            result.links_crawled,
            result.total_links_found,
            result.sub_pages.iter().filter(|p| p.is_ok()).count()
        );
        Ok(result)
    }

    /// Fetches every candidate, keeping candidate order in the output.
    async fn crawl(&self, links: Vec<Link>) -> Vec<SubPageResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<SubPageResult>> = vec![None; links.len()];

        for (idx, link) in links.iter().cloned().enumerate() {
            let renderer = Arc::clone(&self.renderer);
            let semaphore = Arc::clone(&semaphore);
            let sub_page_timeout = self.config.sub_page_timeout;
            let limit = self.config.content_limit;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, SubPageResult::failed(&link, "crawl cancelled"));
                };
                let page = match timeout(sub_page_timeout, renderer.extract(&link.url)).await {
                    Ok(Ok(page)) => SubPageResult {
                        url: link.url.clone(),
                        title: page.title,
                        content: summarize(&page.text, limit),
                        link_text: link.text.clone(),
                        error: None,
                    },
                    Ok(Err(e)) => {
                        warn!("Failed to read sub-page {}: {}", link.url, e);
                        SubPageResult::failed(&link, e.to_string())
                    }
                    Err(_) => {
                        warn!("Sub-page {} timed out", link.url);
                        SubPageResult::failed(&link, format!("timed out after {:?}", sub_page_timeout))
                    }
                };
                (idx, page)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, page)) => slots[idx] = Some(page),
                Err(e) => warn!("Crawl task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(links.iter())
            .map(|(slot, link)| slot.unwrap_or_else(|| SubPageResult::failed(link, "crawl task failed")))
            .collect()
    }
}
