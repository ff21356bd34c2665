//! In-memory cache of retriever results.
//!
//! Keyed by the (normalised query, retriever name, domain filter) triple so
//! that repeated sub-queries within a session, or across sessions sharing
//! the cache, do not spend backend quota twice. Uses [`moka`] for
//! async-friendly caching with TTL and automatic eviction.

use std::time::Duration;

use moka::future::Cache;

use crate::types::SearchResult;

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 500;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    retriever: String,
    domains: Vec<String>,
}

impl CacheKey {
    /// Build a key. The query is trimmed and lowercased; domains are
    /// lowercased, sorted and deduplicated so their order does not matter.
    pub fn new(query: &str, retriever: &str, domains: &[String]) -> Self {
        let mut domains: Vec<String> = domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();
        Self {
            query: query.trim().to_lowercase(),
            retriever: retriever.to_owned(),
            domains,
        }
    }
}

/// TTL cache of search results. A zero TTL disables it.
#[derive(Clone)]
pub struct SearchCache {
    inner: Option<Cache<CacheKey, Vec<SearchResult>>>,
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl SearchCache {
    /// Create a cache whose entries live for `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Cached results for `key`, if present and fresh.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<SearchResult>> {
        self.inner.as_ref()?.get(key).await
    }

    /// Store results. Empty result sets are not cached so a failed
    /// backend is retried on the next query.
    pub async fn insert(&self, key: CacheKey, results: Vec<SearchResult>) {
        if results.is_empty() {
            return;
        }
        if let Some(cache) = &self.inner {
            cache.insert(key, results).await;
        }
    }
}
