//! Retrieval configuration with sensible defaults.
//!
//! [`RetrievalConfig`] controls which retrievers and scraper are used,
//! result counts, worker-pool sizing, rate limiting, timeouts and caching.
//! It is `serde`-friendly so the application can embed it in its TOML file.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::RetrievalError;
use crate::types::ScraperKind;

/// Largest accepted `rate_limit_delay_secs`.
pub const MAX_RATE_LIMIT_DELAY_SECS: f64 = 3600.0;

/// Name of the backend used when nothing else is configured.
pub const DEFAULT_RETRIEVER: &str = "tavily";

/// Configuration consumed by the retrieval core.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Single retriever name, used when `retrievers` is empty.
    pub retriever: String,
    /// Ordered retriever names. Accepts a TOML list or a comma-separated string.
    #[serde(deserialize_with = "string_or_list")]
    pub retrievers: Vec<String>,
    /// Raise a config error for unknown retriever names instead of
    /// falling back to the default backend.
    pub strict_retriever_names: bool,
    /// Scraper strategy for URLs that are neither PDFs nor arXiv papers.
    pub scraper: ScraperKind,
    /// Maximum number of search results per sub-query.
    pub max_results: usize,
    /// Maximum concurrent scrape tasks per worker pool.
    pub max_workers: usize,
    /// Minimum seconds between any two scrape request starts, process-wide.
    pub rate_limit_delay_secs: f64,
    /// HTTP request timeout in seconds for backends and page fetches.
    pub timeout_seconds: u64,
    /// Upper bound on one strategy call; time spent queueing for a worker slot
    /// is not counted.
    pub scrape_timeout_seconds: u64,
    /// How long to cache search results in seconds. Set to 0 to disable caching.
    pub cache_ttl_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Credentials keyed by environment-variable name (e.g. `TAVILY_API_KEY`).
    /// Entries here take precedence over the process environment.
    pub api_keys: HashMap<String, String>,
    /// Base-URL overrides keyed by retriever or scraper name.
    pub endpoints: HashMap<String, String>,
    /// Per-retriever circuit breaker tuning.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retriever: DEFAULT_RETRIEVER.to_owned(),
            retrievers: Vec::new(),
            strict_retriever_names: false,
            scraper: ScraperKind::Static,
            max_results: 5,
            max_workers: 15,
            rate_limit_delay_secs: 0.0,
            timeout_seconds: 10,
            scrape_timeout_seconds: 30,
            cache_ttl_seconds: 600,
            user_agent: None,
            api_keys: HashMap::new(),
            endpoints: HashMap::new(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `max_workers` must be greater than 0
    /// - `timeout_seconds` and `scrape_timeout_seconds` must be greater than 0
    /// - `rate_limit_delay_secs` must be between 0 and [`MAX_RATE_LIMIT_DELAY_SECS`]
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.max_results == 0 {
            return Err(RetrievalError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(RetrievalError::Config(
                "max_workers must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(RetrievalError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.scrape_timeout_seconds == 0 {
            return Err(RetrievalError::Config(
                "scrape_timeout_seconds must be greater than 0".into(),
            ));
        }
        if !(0.0..=MAX_RATE_LIMIT_DELAY_SECS).contains(&self.rate_limit_delay_secs) {
            return Err(RetrievalError::Config(format!(
                "rate_limit_delay_secs must be between 0 and {MAX_RATE_LIMIT_DELAY_SECS}"
            )));
        }
        Ok(())
    }

    /// The configured scrape spacing; negative or non-finite values become zero.
    pub fn rate_limit_delay(&self) -> Duration {
        seconds_to_duration(self.rate_limit_delay_secs)
    }

    /// Look up a credential, preferring `api_keys` over the environment.
    ///
    /// Blank values count as missing.
    pub fn credential(&self, var: &str) -> Option<String> {
        self.api_keys
            .get(var)
            .cloned()
            .or_else(|| std::env::var(var).ok())
            .filter(|value| !value.trim().is_empty())
    }

    /// Base URL for a backend: the configured override or `default`.
    pub fn endpoint(&self, name: &str, default: &str) -> String {
        self.endpoints
            .get(name)
            .map_or(default, String::as_str)
            .trim_end_matches('/')
            .to_owned()
    }
}

/// Convert fractional seconds to a [`Duration`], clamping bad input to zero
/// and values too large to represent to [`Duration::MAX`].
pub fn seconds_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Split a comma-separated name list, trimming whitespace and dropping blanks.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(raw) => split_names(&raw),
        StringOrList::Many(names) => names
            .iter()
            .flat_map(|name| split_names(name))
            .collect(),
    })
}
