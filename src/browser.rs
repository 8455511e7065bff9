//! Headless Chrome page fetching for JavaScript-rendered pages.
//!
//! Only available with the `headless` Cargo feature. One Chrome process is
//! launched lazily and shared; every fetch runs in its own tab, admitted
//! through a tab semaphore. Wrap a [`BrowserFetcher`] in an `HtmlRenderer` to
//! use it for enrichment and deep reading.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::fetcher::{PageFetcher, USER_AGENT};
use crate::{Result, SearchError};

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(not(target_os = "macos"))]
const INSTALL_PATHS: &[&str] = &[
    "/opt/google/chrome/chrome",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

const PATH_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Flags passed to every launch; they hide automation markers and keep the
/// process lean.
const LAUNCH_FLAGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--mute-audio",
    "--no-first-run",
];

/// Locates Chrome: `CHROME` env var, then `PATH`, then install locations.
pub fn detect_chrome() -> Option<PathBuf> {
    let from_env = std::env::var_os("CHROME")
        .map(PathBuf::from)
        .filter(|p| p.exists());
    if let Some(path) = from_env {
        debug!("Chrome from CHROME: {}", path.display());
        return Some(path);
    }

    PATH_COMMANDS
        .iter()
        .find_map(|cmd| which::which(cmd).ok())
        .or_else(|| {
            INSTALL_PATHS
                .iter()
                .map(Path::new)
                .find(|p| p.exists())
                .map(Path::to_path_buf)
        })
}

/// When a freshly opened tab counts as rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WaitStrategy {
    /// The load event fired.
    #[default]
    Load,
    /// The load event fired, then `idle_ms` more for late XHR content.
    NetworkIdle { idle_ms: u64 },
    /// `css` matches, or `timeout_ms` elapsed (the page is read either way).
    Selector { css: String, timeout_ms: u64 },
}

/// Image encoding of a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Png,
    Jpeg { quality: i64 },
}

impl CaptureFormat {
    /// Full-page captures are JPEG at quality 90, viewport captures PNG.
    pub fn for_capture(full_page: bool) -> Self {
        if full_page {
            CaptureFormat::Jpeg { quality: 90 }
        } else {
            CaptureFormat::Png
        }
    }

    /// File extension for the encoded image.
    pub fn extension(self) -> &'static str {
        match self {
            CaptureFormat::Png => "png",
            CaptureFormat::Jpeg { .. } => "jpg",
        }
    }

    fn params(self, full_page: bool) -> ScreenshotParams {
        let builder = ScreenshotParams::builder().full_page(full_page);
        match self {
            CaptureFormat::Png => builder.format(CaptureScreenshotFormat::Png).build(),
            CaptureFormat::Jpeg { quality } => builder
                .format(CaptureScreenshotFormat::Jpeg)
                .quality(quality)
                .build(),
        }
    }
}

/// Configuration for [`BrowserPool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserPoolConfig {
    /// Tabs open at once.
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chrome executable; detected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    /// Extra command-line flags.
    #[serde(default)]
    pub launch_args: Vec<String>,
}

fn default_max_tabs() -> usize {
    4
}

fn default_headless() -> bool {
    true
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            max_tabs: default_max_tabs(),
            headless: default_headless(),
            chrome_path: None,
            launch_args: Vec::new(),
        }
    }
}

/// A lazily launched Chrome process shared by all tabs.
pub struct BrowserPool {
    config: BrowserPoolConfig,
    browser: Mutex<Option<Arc<Browser>>>,
    tabs: Arc<Semaphore>,
}

impl BrowserPool {
    pub fn new(config: BrowserPoolConfig) -> Self {
        let tabs = Arc::new(Semaphore::new(config.max_tabs.max(1)));
        Self {
            config,
            browser: Mutex::new(None),
            tabs,
        }
    }

    /// Tab permits not currently in use.
    pub fn available_tabs(&self) -> usize {
        self.tabs.available_permits()
    }

    fn chrome_executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.chrome_path {
            return Ok(path.clone());
        }
        detect_chrome().ok_or_else(|| {
            SearchError::Browser("Chrome not found; install it or set CHROME".to_string())
        })
    }

    /// Returns the shared browser, launching it on first use.
    pub async fn browser(&self) -> Result<Arc<Browser>> {
        let mut slot = self.browser.lock().await;
        if let Some(browser) = slot.as_ref() {
            return Ok(Arc::clone(browser));
        }
        let browser = Arc::new(self.launch().await?);
        *slot = Some(Arc::clone(&browser));
        Ok(browser)
    }

    async fn launch(&self) -> Result<Browser> {
        let chrome = self.chrome_executable()?;
        debug!("Launching Chrome at {}", chrome.display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .arg(format!("--user-agent={}", USER_AGENT));
        if self.config.headless {
            builder = builder.arg("--headless=new");
        }
        let extra = self.config.launch_args.iter().map(String::as_str);
        for flag in LAUNCH_FLAGS.iter().copied().chain(extra) {
            builder = builder.arg(flag);
        }
        let config = builder
            .build()
            .map_err(|e| SearchError::Browser(format!("Invalid browser config: {}", e)))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(cdp("Failed to launch browser"))?;

        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    warn!("CDP event error: {}", e);
                }
            }
            debug!("CDP event loop finished");
        });

        Ok(browser)
    }

    /// Releases the pool's browser handle.
    pub async fn shutdown(&self) {
        if self.browser.lock().await.take().is_some() {
            debug!("Browser pool shut down");
        }
    }
}

fn cdp(context: &'static str) -> impl Fn(CdpError) -> SearchError {
    move |e| SearchError::Browser(format!("{}: {}", context, e))
}

/// A [`PageFetcher`] that returns the DOM of a page after Chrome renders it.
pub struct BrowserFetcher {
    pool: Arc<BrowserPool>,
    wait: WaitStrategy,
    user_agent: Option<String>,
}

impl BrowserFetcher {
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self {
            pool,
            wait: WaitStrategy::default(),
            user_agent: None,
        }
    }

    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Overrides the user agent for each tab.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    async fn settle(&self, page: &Page) -> Result<()> {
        match &self.wait {
            WaitStrategy::Load => {
                page.wait_for_navigation().await.map_err(cdp("Navigation failed"))?;
            }
            WaitStrategy::NetworkIdle { idle_ms } => {
                page.wait_for_navigation().await.map_err(cdp("Navigation failed"))?;
                tokio::time::sleep(Duration::from_millis(*idle_ms)).await;
            }
            WaitStrategy::Selector { css, timeout_ms } => {
                let wait = Duration::from_millis(*timeout_ms);
                let matched = tokio::time::timeout(wait, page.find_element(css.as_str())).await;
                if !matches!(matched, Ok(Ok(_))) {
                    debug!("'{}' did not appear within {:?}", css, wait);
                }
            }
        }
        Ok(())
    }

    async fn render(&self, page: &Page) -> Result<String> {
        if let Some(ua) = &self.user_agent {
            page.set_user_agent(SetUserAgentOverrideParams::new(ua.as_str()))
                .await
                .map_err(cdp("Failed to set user agent"))?;
        }
        self.settle(page).await?;
        page.content().await.map_err(cdp("Failed to read page content"))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let (_tab, page) = self.open_tab(url).await?;
        let html = self.render(&page).await;
        close_tab(page, url).await;
        html
    }
}

impl BrowserFetcher {
    /// Captures `url` once it has rendered, as encoded image bytes.
    ///
    /// `full_page` captures the whole scrollable page instead of the
    /// viewport; see [`CaptureFormat::for_capture`] for the encoding.
    pub async fn screenshot(&self, url: &str, full_page: bool) -> Result<Vec<u8>> {
        let (_tab, page) = self.open_tab(url).await?;
        let image = self.capture(&page, full_page).await;
        close_tab(page, url).await;
        image
    }

    async fn capture(&self, page: &Page, full_page: bool) -> Result<Vec<u8>> {
        self.settle(page).await?;
        let params = CaptureFormat::for_capture(full_page).params(full_page);
        page.screenshot(params).await.map_err(cdp("Failed to capture screenshot"))
    }

    /// Waits for a tab permit, then opens `url` in a new tab.
    async fn open_tab(&self, url: &str) -> Result<(OwnedSemaphorePermit, Page)> {
        let permit = Arc::clone(&self.pool.tabs)
            .acquire_owned()
            .await
            .map_err(|_| SearchError::Browser("Browser pool closed".to_string()))?;

        let browser = self.pool.browser().await?;
        let page = browser.new_page(url).await.map_err(cdp("Failed to open tab"))?;
        Ok((permit, page))
    }
}

async fn close_tab(page: Page, url: &str) {
    if let Err(e) = page.close().await {
        warn!("Failed to close tab for {}: {}", url, e);
    }
}
