//! Concurrent scraping of a batch of URLs.
//!
//! The [`ScraperDispatcher`] routes each URL to a strategy, runs every
//! attempt inside the worker pool's throttle, and normalises each outcome
//! into a [`ScrapedDocument`]. Batches never fail: errors, timeouts and
//! short pages all become unsuccessful documents.
//!
//! # Routing
//!
//! ```text
//! path ends with .pdf   ──► pdf
//! host contains arxiv.org ──► arxiv
//! anything else         ──► configured default (bs)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::rate_limit::RateLimiter;
use crate::scraper::ScraperStrategy;
use crate::scrapers::build_strategy;
use crate::types::{ScrapedDocument, ScraperKind};
use crate::worker_pool::WorkerPool;

/// Why a scrape attempt produced no output.
#[derive(Debug, thiserror::Error)]
#[error("{url}: {reason}")]
pub struct ScrapeFailure {
    /// The URL that failed.
    pub url: String,
    /// The underlying error.
    pub reason: RetrievalError,
}

/// A URL predicate in the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    PdfPath,
    ArxivHost,
}

impl Route {
    fn matches(self, url: &Url) -> bool {
        match self {
            Self::PdfPath => url.path().to_ascii_lowercase().ends_with(".pdf"),
            Self::ArxivHost => url
                .host_str()
                .is_some_and(|host| host.to_ascii_lowercase().contains("arxiv.org")),
        }
    }
}

/// Ordered routing table; the first matching predicate wins.
const ROUTES: &[(Route, ScraperKind)] = &[
    (Route::PdfPath, ScraperKind::Pdf),
    (Route::ArxivHost, ScraperKind::Arxiv),
];

/// Routes URLs to strategies and scrapes them concurrently.
pub struct ScraperDispatcher {
    client: reqwest::Client,
    pool: WorkerPool,
    default_kind: ScraperKind,
    strategies: HashMap<ScraperKind, Arc<dyn ScraperStrategy>>,
    scrape_timeout: Duration,
}

impl std::fmt::Debug for ScraperDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperDispatcher")
            .field("default_kind", &self.default_kind)
            .field("max_concurrent", &self.pool.max_concurrent())
            .field("scrape_timeout", &self.scrape_timeout)
            .finish_non_exhaustive()
    }
}

impl ScraperDispatcher {
    /// Create a dispatcher with its own worker pool on the shared `limiter`.
    ///
    /// The limiter's spacing is reconfigured from `config`; other pools
    /// sharing it see the new value.
    pub fn new(config: &RetrievalConfig, client: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self::with_pool(config, client, WorkerPool::from_config(config, limiter))
    }

    /// Create a dispatcher around an existing pool.
    pub fn with_pool(config: &RetrievalConfig, client: reqwest::Client, pool: WorkerPool) -> Self {
        let strategies = ScraperKind::all()
            .iter()
            .map(|kind| (*kind, build_strategy(*kind, config, &pool)))
            .collect();
        Self {
            client,
            pool,
            default_kind: config.scraper,
            strategies,
            scrape_timeout: Duration::from_secs(config.scrape_timeout_seconds),
        }
    }

    /// Replace the strategy registered for its kind.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ScraperStrategy>) -> Self {
        self.strategies.insert(strategy.kind(), strategy);
        self
    }

    /// The pool bounding this dispatcher's tasks.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Which strategy `url` is sent to.
    pub fn route(&self, url: &str) -> ScraperKind {
        let Ok(parsed) = Url::parse(url) else {
            return self.default_kind;
        };
        ROUTES
            .iter()
            .find(|(route, _)| route.matches(&parsed))
            .map_or(self.default_kind, |(_, kind)| *kind)
    }

    /// Scrape every URL concurrently.
    ///
    /// Returns one document per input URL, in input order.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<ScrapedDocument> {
        self.fetch_all_with_cancel(urls, CancellationToken::new()).await
    }

    /// Like [`fetch_all`](Self::fetch_all), but stops waiting once `cancel`
    /// fires. Documents completed by then are kept; every other URL becomes
    /// a failed document.
    pub async fn fetch_all_with_cancel(
        &self,
        urls: &[String],
        cancel: CancellationToken,
    ) -> Vec<ScrapedDocument> {
        let mut documents: Vec<Option<ScrapedDocument>> = vec![None; urls.len()];
        let mut pending: FuturesUnordered<_> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| async move { (index, self.scrape_one(url).await) })
            .collect();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::warn!(unfinished = pending.len(), "scrape batch cancelled");
                    break;
                }
                next = pending.next() => match next {
                    Some((index, outcome)) => documents[index] = Some(settle(outcome)),
                    None => break,
                },
            }
        }
        drop(pending);

        let documents: Vec<ScrapedDocument> = documents
            .into_iter()
            .zip(urls)
            .map(|(doc, url)| doc.unwrap_or_else(|| ScrapedDocument::failed(url.as_str())))
            .collect();
        tracing::info!(
            requested = urls.len(),
            succeeded = documents.iter().filter(|d| d.success).count(),
            "scrape batch finished"
        );
        documents
    }

    /// One attempt: wait for a slot, then run the routed strategy under the
    /// per-URL timeout. Queueing time does not count against the timeout.
    async fn scrape_one(&self, url: &str) -> Result<ScrapedDocument, ScrapeFailure> {
        let fail = |reason| ScrapeFailure {
            url: url.to_owned(),
            reason,
        };

        let kind = self.route(url);
        let strategy = self
            .strategies
            .get(&kind)
            .ok_or_else(|| fail(RetrievalError::Config(format!("no strategy for {kind}"))))?;

        let _permit = self.pool.throttle().await.map_err(fail)?;
        tracing::debug!(url, scraper = %kind, "scraping");

        let output = tokio::time::timeout(self.scrape_timeout, strategy.scrape(url, &self.client))
            .await
            .map_err(|_| {
                fail(RetrievalError::Timeout(format!(
                    "scrape exceeded {}s",
                    self.scrape_timeout.as_secs()
                )))
            })?
            .map_err(fail)?;

        Ok(ScrapedDocument::from_output(url, output))
    }
}

fn settle(outcome: Result<ScrapedDocument, ScrapeFailure>) -> ScrapedDocument {
    match outcome {
        Ok(document) => document,
        Err(failure) => {
            tracing::warn!(url = %failure.url, error = %failure.reason, "scrape failed");
            ScrapedDocument::failed(failure.url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScrapeOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned text keyed by URL suffix, optionally slowly.
    struct FakeStatic {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScraperStrategy for FakeStatic {
        fn kind(&self) -> ScraperKind {
            ScraperKind::Static
        }

        async fn scrape(&self, url: &str, _client: &reqwest::Client) -> crate::error::Result<ScrapeOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if url.ends_with("/error") {
                return Err(RetrievalError::Http("page returned HTTP 500".into()));
            }
            if url.ends_with("/short") {
                return Ok(ScrapeOutput {
                    content: "tiny".into(),
                    ..Default::default()
                });
            }
            Ok(ScrapeOutput {
                content: format!("{url} ").repeat(20),
                images: Vec::new(),
                title: "Fake".into(),
            })
        }
    }

    fn dispatcher(config: &RetrievalConfig, delay: Duration) -> ScraperDispatcher {
        ScraperDispatcher::new(config, reqwest::Client::new(), Arc::new(RateLimiter::new()))
            .with_strategy(Arc::new(FakeStatic {
                delay,
                calls: AtomicUsize::new(0),
            }))
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| (*u).to_owned()).collect()
    }

    #[test]
    fn routing_table_order() {
        let d = dispatcher(&RetrievalConfig::default(), Duration::ZERO);
        assert_eq!(d.route("https://example.com/paper.PDF"), ScraperKind::Pdf);
        assert_eq!(d.route("https://arxiv.org/pdf/1706.03762.pdf"), ScraperKind::Pdf);
        assert_eq!(d.route("https://arxiv.org/abs/1706.03762"), ScraperKind::Arxiv);
        assert_eq!(d.route("https://export.arxiv.org/abs/1"), ScraperKind::Arxiv);
        assert_eq!(d.route("https://example.com/pdf-guide"), ScraperKind::Static);
        assert_eq!(d.route("not a url"), ScraperKind::Static);
    }

    #[test]
    fn default_route_follows_config() {
        let config = RetrievalConfig {
            scraper: ScraperKind::Browser,
            ..Default::default()
        };
        let d = dispatcher(&config, Duration::ZERO);
        assert_eq!(d.route("https://example.com/"), ScraperKind::Browser);
        assert_eq!(d.route("https://example.com/a.pdf"), ScraperKind::Pdf);
    }

    #[tokio::test]
    async fn results_in_input_order_with_failures_normalised() {
        let d = dispatcher(&RetrievalConfig::default(), Duration::ZERO);
        let input = urls(&["https://a.com/ok", "https://b.com/error", "https://c.com/short", "https://d.com/ok"]);
        let docs = d.fetch_all(&input).await;

        let got: Vec<_> = docs.iter().map(|d| (d.url.as_str(), d.success)).collect();
        assert_eq!(
            got,
            vec![
                ("https://a.com/ok", true),
                ("https://b.com/error", false),
                ("https://c.com/short", false),
                ("https://d.com/ok", true),
            ]
        );
        assert!(docs[1].raw_content.is_none());
        assert!(docs[2].raw_content.is_none());
        assert_eq!(docs[0].title, "Fake");
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let d = dispatcher(&RetrievalConfig::default(), Duration::ZERO);
        assert!(d.fetch_all(&[]).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_strategy_times_out() {
        let config = RetrievalConfig {
            scrape_timeout_seconds: 1,
            ..Default::default()
        };
        let d = dispatcher(&config, Duration::from_secs(5));
        let docs = d.fetch_all(&urls(&["https://slow.com/ok"])).await;
        assert!(!docs[0].success);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_finished_documents() {
        let config = RetrievalConfig {
            max_workers: 1,
            ..Default::default()
        };
        let d = dispatcher(&config, Duration::from_secs(2));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let docs = d
            .fetch_all_with_cancel(&urls(&["https://a.com/ok", "https://b.com/ok", "https://c.com/ok"]), cancel)
            .await;
        assert_eq!(docs.len(), 3);
        assert!(docs[0].success);
        assert!(!docs[1].success);
        assert!(!docs[2].success);
        assert_eq!(d.pool().in_flight(), 0, "dropped tasks release their slots");
    }
}
