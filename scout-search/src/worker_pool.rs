//! Bounded-concurrency executor for scrape tasks.
//!
//! A [`WorkerPool`] owns a local semaphore that caps how many tasks run at
//! once, and funnels every task through the shared [`RateLimiter`]. Pools are
//! cheap; the limiter is the only state shared between them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::rate_limit::RateLimiter;

/// A held pool slot. The slot is released when this value is dropped,
/// whether the task returned, failed, panicked or was cancelled.
#[derive(Debug)]
#[must_use = "the pool slot is released as soon as the permit is dropped"]
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}

/// Bounded-concurrency executor sharing a process-wide [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    blocking_slots: Arc<Semaphore>,
    limiter: Arc<RateLimiter>,
    max_concurrent: usize,
}

impl WorkerPool {
    /// Create a pool running at most `max_concurrent` tasks at once.
    ///
    /// Reconfigures the shared limiter to `rate_limit_delay`; with several
    /// pools the most recently created one decides the delay. A
    /// `max_concurrent` of zero is raised to one.
    pub fn new(max_concurrent: usize, rate_limit_delay: Duration, limiter: Arc<RateLimiter>) -> Self {
        let max_concurrent = max_concurrent.max(1);
        limiter.configure(rate_limit_delay);
        tracing::debug!(
            max_concurrent,
            delay_ms = rate_limit_delay.as_millis() as u64,
            "worker pool created"
        );
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
            blocking_slots: Arc::new(Semaphore::new(max_concurrent)),
            limiter,
            max_concurrent,
        }
    }

    /// Create a pool sized from `max_workers` and `rate_limit_delay_secs`.
    pub fn from_config(config: &RetrievalConfig, limiter: Arc<RateLimiter>) -> Self {
        Self::new(config.max_workers, config.rate_limit_delay(), limiter)
    }

    /// Acquire a slot, then wait on the shared rate limiter.
    ///
    /// Suspends until a slot is free. The returned permit must be held for
    /// the duration of the request.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Scrape`] only if the pool has been closed.
    pub async fn throttle(&self) -> Result<ThrottlePermit, RetrievalError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| RetrievalError::Scrape("worker pool closed".into()))?;
        self.limiter.wait_if_needed().await;
        Ok(ThrottlePermit { _permit: permit })
    }

    /// Run `task` inside [`throttle`](Self::throttle).
    ///
    /// # Errors
    ///
    /// Same as [`throttle`](Self::throttle); errors from `task` itself are
    /// part of `T` and returned untouched.
    pub async fn run<F, T>(&self, task: F) -> Result<T, RetrievalError>
    where
        F: Future<Output = T>,
    {
        let _permit = self.throttle().await?;
        Ok(task.await)
    }

    /// Run blocking work on tokio's blocking thread pool.
    ///
    /// At most `max_concurrent` closures from this pool occupy blocking
    /// threads at once. This does not take a regular slot, so it can be
    /// called from inside a throttled task.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Scrape`] if the closure panicked or the pool
    /// was closed.
    pub async fn run_blocking<F, T>(&self, work: F) -> Result<T, RetrievalError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = Arc::clone(&self.blocking_slots)
            .acquire_owned()
            .await
            .map_err(|_| RetrievalError::Scrape("worker pool closed".into()))?;
        tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| RetrievalError::Scrape(format!("blocking task failed: {e}")))
    }

    /// Maximum number of concurrently running tasks.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.slots.available_permits()
    }

    /// The shared limiter this pool waits on.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
