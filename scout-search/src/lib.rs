//! # scout-search
//!
//! Concurrent multi-source retrieval and scraping for Scout research sessions.
//!
//! Given sub-queries from an upstream planner, this crate finds candidate
//! pages through pluggable search backends and turns them into normalised
//! [`ScrapedDocument`]s, fetching many pages at once without exceeding a
//! worker limit or a process-wide request spacing.
//!
//! ## Design
//!
//! - [`RetrieverRegistry`] maps backend names (Tavily, Serper, Google, Bing,
//!   DuckDuckGo, SearxNG, arXiv, Semantic Scholar, custom) to factories and
//!   resolves the ordered set for a request from headers and configuration
//! - [`SearchOrchestrator`] queries them in priority order, merges by
//!   canonical URL, caches result sets and skips backends whose circuit is open
//! - [`ScraperDispatcher`] routes each URL (PDF, arXiv, default strategy),
//!   bounds concurrency with a [`WorkerPool`] and spaces request starts with
//!   a shared [`RateLimiter`]
//! - [`VisitedUrls`] keeps a session from scraping the same page twice
//! - Failures never abort a batch: a broken backend yields no results and a
//!   broken page yields an unsuccessful document
//!
//! ## Security
//!
//! - Credentials come from configuration or the environment and never
//!   appear in errors or logs
//! - Search queries are logged only at trace level

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod merge;
pub mod orchestrator;
pub mod rate_limit;
pub mod registry;
pub mod retriever;
pub mod retrievers;
pub mod scraper;
pub mod scrapers;
pub mod tracker;
pub mod types;
pub mod worker_pool;

pub use config::RetrievalConfig;
pub use dispatch::{ScrapeFailure, ScraperDispatcher};
pub use error::{Result, RetrievalError};
pub use orchestrator::SearchOrchestrator;
pub use rate_limit::RateLimiter;
pub use registry::{ResolvedRetriever, RetrieverRegistry};
pub use retriever::{RequestHeaders, RetrieverArgs, RetrieverFactory, SearchRetriever};
pub use scraper::ScraperStrategy;
pub use tracker::VisitedUrls;
pub use types::{ImageCandidate, ScrapeOutput, ScrapedDocument, ScraperKind, SearchResult};
pub use worker_pool::WorkerPool;

use std::sync::Arc;

/// Search with the built-in backends selected by `config`.
///
/// Convenience wrapper that builds a client and a [`SearchOrchestrator`]
/// for a single query. Long-lived callers should keep an orchestrator so
/// the cache and circuit breaker persist between queries.
///
/// # Errors
///
/// [`RetrievalError::Config`] for invalid configuration, otherwise as
/// [`SearchOrchestrator::search`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scout_search::Result<()> {
/// let config = scout_search::RetrievalConfig {
///     retriever: "duckduckgo".into(),
///     ..Default::default()
/// };
/// let results = scout_search::search("rust async runtimes", &config).await?;
/// for result in &results {
///     println!("{}: {}", result.title.as_deref().unwrap_or("untitled"), result.href);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &RetrievalConfig) -> Result<Vec<SearchResult>> {
    config.validate()?;
    let client = http::build_client(config)?;
    let orchestrator = SearchOrchestrator::new(
        Arc::new(RetrieverRegistry::with_builtin()),
        Arc::new(config.clone()),
        client,
    );
    orchestrator.search(query, &RequestHeaders::new(), &[]).await
}

/// Scrape `urls` with a fresh dispatcher and its own rate limiter.
///
/// Returns one document per URL, in input order.
///
/// # Errors
///
/// [`RetrievalError::Config`] for invalid configuration or
/// [`RetrievalError::Http`] if the HTTP client cannot be built. Page
/// failures are reported in the documents, never as errors.
pub async fn scrape_urls(urls: &[String], config: &RetrievalConfig) -> Result<Vec<ScrapedDocument>> {
    config.validate()?;
    let client = http::build_client(config)?;
    let dispatcher = ScraperDispatcher::new(config, client, Arc::new(RateLimiter::new()));
    Ok(dispatcher.fetch_all(urls).await)
}
