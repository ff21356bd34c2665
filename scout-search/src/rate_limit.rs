//! Process-wide minimum spacing between scrape request starts.
//!
//! One [`RateLimiter`] is created at application startup and shared by
//! reference (`Arc`) with every [`WorkerPool`](crate::worker_pool::WorkerPool),
//! including pools owned by independent research sessions. Each pool bounds
//! its own concurrency; the limiter bounds how quickly requests start across
//! all of them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::seconds_to_duration;

/// Shared minimum-delay gate for scrape requests.
///
/// Guarantees spacing between starts only; waiters are served in lock
/// acquisition order, which tokio's mutex keeps FIFO.
#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Minimum delay in nanoseconds. Zero disables limiting.
    min_delay_nanos: AtomicU64,
    /// When the most recent request was allowed to start.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter that does not delay anything until configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a limiter with an initial minimum delay.
    pub fn with_delay(delay: Duration) -> Self {
        let limiter = Self::new();
        limiter.configure(delay);
        limiter
    }

    /// Set the minimum delay between request starts. Last call wins.
    pub fn configure(&self, delay: Duration) {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        let previous = self.min_delay_nanos.swap(nanos, Ordering::SeqCst);
        if previous != nanos {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "rate limit reconfigured");
        }
    }

    /// Set the delay from fractional seconds; negative or non-finite is zero.
    pub fn configure_secs(&self, secs: f64) {
        self.configure(seconds_to_duration(secs));
    }

    /// The current minimum delay.
    pub fn delay(&self) -> Duration {
        Duration::from_nanos(self.min_delay_nanos.load(Ordering::SeqCst))
    }

    /// Wait until at least [`delay`](Self::delay) has passed since the
    /// previous request start, then record a new start.
    ///
    /// Returns immediately without locking when the delay is zero.
    pub async fn wait_if_needed(&self) {
        let delay = self.delay();
        if delay.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                let wait = delay - elapsed;
                tracing::trace!(wait_ms = wait.as_millis() as u64, "rate limit wait");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Forget the last request so the next call proceeds immediately.
    pub async fn reset(&self) {
        *self.last_request.lock().await = None;
    }
}
