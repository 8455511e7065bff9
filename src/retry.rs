//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, SearchError};

/// Backoff schedule for retried operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A schedule that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Multipliers below 1.0 keep the delay flat; ones that overflow or are
    /// not a number jump straight to `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        let factor = if self.multiplier < 1.0 { 1.0 } else { self.multiplier };
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
            .map_or(self.max_delay, |next| next.min(self.max_delay))
    }
}

/// Runs `op` until it succeeds or `config.max_attempts` is reached.
///
/// Only transient failures (see [`SearchError::is_transient`]) are retried;
/// any other error is returned as is. Sleeps between attempts, growing the
/// delay by `multiplier` up to `max_delay`. Cancellation is by dropping the
/// returned future.
pub async fn retry_with_backoff<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut last_err = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = Some(e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(delay).await;
            delay = config.next_delay(delay);
        }
    }

    let last = last_err.map(|e| e.to_string()).unwrap_or_default();
    Err(SearchError::Other(format!(
        "failed after {} attempts: {}",
        attempts, last
    )))
}
