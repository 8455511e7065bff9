//! Page fetching: URL in, raw HTML out.
//!
//! `HttpFetcher` covers server-rendered pages; `BrowserFetcher` (headless
//! feature) covers pages that need JavaScript.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::retry::{retry_with_backoff, RetryConfig};
use crate::Result;

/// Trait for fetching the full HTML content of a URL.
///
/// All configuration (user-agent, timeouts, retries) is set at construction
/// time; `fetch` is a simple URL-in, HTML-out interface.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the HTML content of the given URL.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Browser-like user agent; several sites serve empty shells to bots.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Suitable for server-rendered pages. For pages that need JavaScript,
/// use `BrowserFetcher` instead.
pub struct HttpFetcher {
    client: Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` with a 20 second request timeout and a
    /// single retry.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay: Duration::from_millis(500),
                ..RetryConfig::default()
            },
        }
    }

    /// Sets the retry schedule.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        retry_with_backoff(&self.retry, || self.fetch_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::SearchError;

    #[test]
    fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.retry.max_attempts, 2);
    }

    #[test]
    fn test_http_fetcher_with_client() {
        let client = Client::builder().user_agent("test-agent").build().unwrap();
        let fetcher = HttpFetcher::with_client(client).with_retry(RetryConfig::none());
        assert_eq!(fetcher.retry.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_http_fetcher_invalid_url_fails() {
        let fetcher = HttpFetcher::new().unwrap().with_retry(RetryConfig::none());
        assert!(fetcher.fetch("not a url").await.is_err());
    }

    /// Serves every connection with `status` and counts the requests.
    async fn serve_status(status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{}/page", addr), hits)
    }

    fn local_fetcher() -> HttpFetcher {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpFetcher::with_client(client).with_retry(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        })
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (url, hits) = serve_status("404 Not Found").await;
        let fetcher = local_fetcher();

        let err = fetcher.fetch(&url).await.unwrap_err();
        match err {
            SearchError::Http(e) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
            other => panic!("expected HTTP error, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (url, hits) = serve_status("503 Service Unavailable").await;
        let fetcher = local_fetcher();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().starts_with("failed after 3 attempts"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
