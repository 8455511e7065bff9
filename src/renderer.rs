//! Readable-content extraction from fetched pages.
//!
//! A [`PageRenderer`] turns a URL into typed page data: title, readable text
//! and, for seed pages, the outbound links. [`HtmlRenderer`] implements it on
//! top of any [`PageFetcher`], selecting content with `scraper` and turning it
//! into text with `html2text`.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::link::{Link, LinkKind};
use crate::text::{clean_text, tidy_lines, truncate_chars};
use crate::{Result, SearchError};

/// Containers tried, in order, for the main content of a page.
const MAIN_CONTENT_SELECTOR: &str = "main, article, .content, #content, .post, .entry-content";

/// Elements dropped before conversion.
const SKIPPED_SELECTOR: &str = "script, style, noscript, template, svg, iframe";

/// Column width handed to `html2text`; long enough that prose rarely wraps.
const TEXT_WIDTH: usize = 120;

/// Anchor texts longer than this are cut.
const MAX_ANCHOR_CHARS: usize = 100;

/// Title and readable text of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// Page title.
    pub title: String,
    /// Cleaned readable text.
    pub text: String,
}

impl RenderedPage {
    /// Renders the page as markdown: a title heading followed by the text.
    pub fn to_markdown(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("# {}\n\n{}", self.title, self.text)
        }
    }
}

/// A rendered page together with its outbound links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedPage {
    /// Page title.
    pub title: String,
    /// Cleaned readable text.
    pub text: String,
    /// Every link found on the page, in document order.
    pub links: Vec<Link>,
}

/// Capability that renders pages into readable text.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Extracts title and readable text.
    async fn extract(&self, url: &str) -> Result<RenderedPage>;

    /// Extracts title, readable text and all outbound links.
    async fn extract_links_and_content(&self, url: &str) -> Result<LinkedPage>;
}

/// Renderer that parses HTML obtained from a [`PageFetcher`].
pub struct HtmlRenderer {
    fetcher: Arc<dyn PageFetcher>,
}

impl HtmlRenderer {
    /// Creates a renderer on top of the given fetcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Creates a renderer backed by a plain HTTP fetcher.
    pub fn http() -> Result<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new()?)))
    }
}

#[async_trait]
impl PageRenderer for HtmlRenderer {
    async fn extract(&self, url: &str) -> Result<RenderedPage> {
        let base = Url::parse(url)?;
        let html = self.fetcher.fetch(url).await?;
        let page = parse_page(&html, &base)?;
        Ok(RenderedPage {
            title: page.title,
            text: page.text,
        })
    }

    async fn extract_links_and_content(&self, url: &str) -> Result<LinkedPage> {
        let base = Url::parse(url)?;
        let html = self.fetcher.fetch(url).await?;
        parse_page(&html, &base)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))
}

/// Parses an HTML document into title, readable text and links.
///
/// The main container is picked with `scraper`, stripped of scripts and
/// styles, then converted with `html2text` so headings, list items, code
/// blocks and link targets keep their structure.
pub fn parse_page(html: &str, base: &Url) -> Result<LinkedPage> {
    let mut document = Html::parse_document(html);

    let title = first_text(&document, "title")?
        .or(first_text(&document, "h1")?)
        .unwrap_or_default();
    let links = collect_links(&document, base)?;

    let skipped: Vec<_> = document
        .select(&selector(SKIPPED_SELECTOR)?)
        .map(|e| e.id())
        .collect();
    for id in skipped {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let main_html = document
        .select(&selector(MAIN_CONTENT_SELECTOR)?)
        .next()
        .or_else(|| document.select(&selector("body").ok()?).next())
        .unwrap_or_else(|| document.root_element())
        .html();

    let converted = html2text::from_read(main_html.as_bytes(), TEXT_WIDTH)
        .map_err(|e| SearchError::Render(format!("failed to convert {}: {}", base, e)))?;
    let text = tidy_lines(&converted);
    if text.is_empty() {
        return Err(SearchError::Render(format!("no readable content at {}", base)));
    }

    Ok(LinkedPage { title, text, links })
}

fn first_text(document: &Html, css: &str) -> Result<Option<String>> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .map(|e| clean_text(&e.text().collect::<String>()))
        .filter(|t| !t.is_empty()))
}

fn collect_links(document: &Html, base: &Url) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    for anchor in document.select(&selector("a[href]")?) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href.trim()) else {
            continue;
        };

        let mut text = clean_text(&anchor.text().collect::<String>()).replace('\n', " ");
        if text.is_empty() {
            text = anchor.value().attr("aria-label").unwrap_or_default().trim().to_string();
        }
        if text.is_empty() {
            continue;
        }

        links.push(Link {
            url: url.into(),
            text: truncate_chars(&text, MAX_ANCHOR_CHARS).to_string(),
            kind: link_kind(anchor),
        });
    }

    Ok(links)
}

fn link_kind(anchor: ElementRef<'_>) -> LinkKind {
    let element = anchor.value();
    let is_button = element.attr("role") == Some("button")
        || element
            .classes()
            .any(|class| class.contains("btn") || class.contains("button"));
    if is_button {
        LinkKind::Button
    } else {
        LinkKind::Link
    }
}
