//! Multi-retriever search for one sub-query.
//!
//! The [`SearchOrchestrator`] resolves the retrievers for a request and
//! consults them in priority order until enough unique results are
//! collected.
//!
//! # Pipeline
//!
//! 1. Resolve retriever names from headers and configuration
//! 2. For each retriever, in order, while fewer than `max_results` unique
//!    results are held:
//!    - skip it if its circuit is open (unless it is the last one left)
//!    - serve from the cache when possible
//!    - otherwise construct it and query it, feeding the circuit breaker
//! 3. Merge by canonical URL; earlier retrievers keep their positions

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::{CacheKey, SearchCache};
use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::merge::ResultMerger;
use crate::registry::{ResolvedRetriever, RetrieverRegistry};
use crate::retriever::{settle, RequestHeaders, RetrieverArgs};
use crate::types::SearchResult;

/// Queries retrievers for sub-queries of one or more research sessions.
///
/// Cloning shares the cache and circuit breaker.
#[derive(Clone)]
pub struct SearchOrchestrator {
    registry: Arc<RetrieverRegistry>,
    config: Arc<RetrievalConfig>,
    client: reqwest::Client,
    breaker: Arc<Mutex<CircuitBreaker>>,
    cache: SearchCache,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("retrievers", &self.registry.names())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    /// Create an orchestrator over `registry`.
    pub fn new(registry: Arc<RetrieverRegistry>, config: Arc<RetrievalConfig>, client: reqwest::Client) -> Self {
        let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        let cache = SearchCache::new(config.cache_ttl_seconds);
        Self {
            registry,
            config,
            client,
            breaker: Arc::new(Mutex::new(breaker)),
            cache,
        }
    }

    /// The configuration retrievers are built with.
    pub fn config(&self) -> &Arc<RetrievalConfig> {
        &self.config
    }

    /// `(name, state, consecutive_failures)` per retriever seen so far.
    pub fn health_report(&self) -> Vec<(String, CircuitState, u32)> {
        self.breaker().health_report()
    }

    /// Search for `query`, returning at most `config.max_results` unique results.
    ///
    /// Retriever failures are logged and skipped; an empty list is a valid
    /// outcome.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::Config`] if resolution fails (strict mode).
    /// - [`RetrievalError::AllRetrieversFailed`] if no resolved retriever
    ///   could be constructed.
    pub async fn search(
        &self,
        query: &str,
        headers: &RequestHeaders,
        domains: &[String],
    ) -> Result<Vec<SearchResult>> {
        let resolved = self.registry.resolve(headers, &self.config)?;
        let max_results = self.config.max_results;
        tracing::trace!(query, "sub-query search");

        let mut merger = ResultMerger::new(max_results);
        let mut construction_errors: Vec<String> = Vec::new();
        let mut constructed = 0usize;

        for (position, retriever) in resolved.iter().enumerate() {
            if merger.is_full() {
                break;
            }
            let is_last = position + 1 == resolved.len();
            let allowed = is_last || self.breaker().should_attempt(retriever.name);
            if !allowed {
                tracing::debug!(retriever = retriever.name, "circuit open, skipping");
                continue;
            }

            let key = CacheKey::new(query, retriever.name, domains);
            if let Some(cached) = self.cache.get(&key).await {
                tracing::debug!(retriever = retriever.name, count = cached.len(), "cache hit");
                constructed += 1;
                merger.absorb(cached);
                continue;
            }

            match self.query_one(retriever, query, headers, domains, max_results).await {
                Ok(results) => {
                    constructed += 1;
                    self.cache.insert(key, results.clone()).await;
                    let accepted = merger.absorb(results);
                    tracing::debug!(retriever = retriever.name, accepted, "results merged");
                }
                Err(err) => {
                    tracing::warn!(retriever = retriever.name, error = %err, "retriever unavailable");
                    construction_errors.push(format!("{}: {err}", retriever.name));
                }
            }
        }

        if constructed == 0 && !construction_errors.is_empty() {
            return Err(RetrievalError::AllRetrieversFailed(construction_errors.join("; ")));
        }

        let results = merger.into_results();
        tracing::info!(count = results.len(), "sub-query search finished");
        Ok(results)
    }

    /// Construct and query one retriever.
    ///
    /// `Err` means the retriever could not be built; query failures are
    /// recorded with the breaker and yield an empty list.
    async fn query_one(
        &self,
        retriever: &ResolvedRetriever,
        query: &str,
        headers: &RequestHeaders,
        domains: &[String],
        max_results: usize,
    ) -> Result<Vec<SearchResult>> {
        let args = RetrieverArgs::new(query, self.client.clone(), Arc::clone(&self.config))
            .with_headers(headers.clone())
            .with_domains(domains.to_vec());
        let backend = (retriever.factory)(args)?;

        let outcome = backend.try_search(max_results).await;
        {
            let mut breaker = self.breaker();
            match &outcome {
                Ok(_) => breaker.record_success(retriever.name),
                Err(_) => breaker.record_failure(retriever.name),
            }
        }
        Ok(settle(retriever.name, outcome, max_results))
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
