//! Trait definition for pluggable search retriever backends.
//!
//! Each backend (Tavily, Serper, Bing, arXiv, ...) implements
//! [`SearchRetriever`] and is constructed by a [`RetrieverFactory`] from
//! [`RetrieverArgs`]. Backends report failures through
//! [`try_search`](SearchRetriever::try_search); callers that want the
//! uniform contract use [`search`](SearchRetriever::search), which never
//! fails and returns an empty list instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::types::SearchResult;

/// Per-request headers. Keys are matched case-insensitively.
pub type RequestHeaders = HashMap<String, String>;

/// Hosts whose results are video pages with no scrapeable text.
const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "tiktok.com",
];

/// Everything a backend needs to answer one query.
#[derive(Debug, Clone)]
pub struct RetrieverArgs {
    /// The sub-query to search for.
    pub query: String,
    /// Per-request headers from the caller.
    pub headers: RequestHeaders,
    /// Restrict results to these domains when the backend supports it.
    pub domains: Vec<String>,
    /// Shared HTTP client.
    pub client: reqwest::Client,
    /// Credentials, endpoint overrides and timeouts.
    pub config: Arc<RetrievalConfig>,
}

impl RetrieverArgs {
    /// Arguments with no headers or domain filter.
    pub fn new(query: impl Into<String>, client: reqwest::Client, config: Arc<RetrievalConfig>) -> Self {
        Self {
            query: query.into(),
            headers: RequestHeaders::new(),
            domains: Vec::new(),
            client,
            config,
        }
    }

    /// Attach request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a domain filter.
    #[must_use]
    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    /// Credential from headers (lowercased variable name), config, or environment.
    pub fn credential(&self, var: &str) -> Option<String> {
        header(&self.headers, &var.to_ascii_lowercase())
            .map(str::to_owned)
            .or_else(|| self.config.credential(var))
    }
}

/// Constructor registered for a backend name.
///
/// Fails only when the backend cannot exist at all, e.g. a missing
/// mandatory credential.
pub type RetrieverFactory = fn(RetrieverArgs) -> Result<Box<dyn SearchRetriever>>;

/// A pluggable search backend bound to one query.
#[async_trait]
pub trait SearchRetriever: Send + Sync {
    /// Registry name of this backend.
    fn name(&self) -> &'static str;

    /// Query the backend, reporting transport and parse failures.
    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Query the backend. Never fails: errors are logged and yield an
    /// empty list. Video-hosting results are removed and the list is
    /// capped at `max_results`.
    async fn search(&self, max_results: usize) -> Vec<SearchResult> {
        settle(self.name(), self.try_search(max_results).await, max_results)
    }
}

/// Convert a backend outcome into the uniform never-fail result list.
pub fn settle(name: &str, outcome: Result<Vec<SearchResult>>, max_results: usize) -> Vec<SearchResult> {
    match outcome {
        Ok(results) => {
            let mut kept: Vec<SearchResult> = results
                .into_iter()
                .filter(|r| !is_irrelevant(&r.href))
                .collect();
            kept.truncate(max_results);
            tracing::debug!(retriever = name, count = kept.len(), "retriever returned results");
            kept
        }
        Err(err) => {
            tracing::warn!(retriever = name, error = %err, "retriever query failed");
            Vec::new()
        }
    }
}

/// Whether a result points at a video host.
pub fn is_irrelevant(href: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    VIDEO_HOSTS
        .iter()
        .any(|video| host == *video || host.ends_with(&format!(".{video}")))
}

/// Case-insensitive header lookup; blank values count as absent.
pub fn header<'a>(headers: &'a RequestHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Append `site:` restrictions for backends without a native domain filter.
pub fn site_query(query: &str, domains: &[String]) -> String {
    let sites: Vec<String> = domains
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(|d| format!("site:{d}"))
        .collect();
    if sites.is_empty() {
        query.to_owned()
    } else {
        format!("{query} {}", sites.join(" OR "))
    }
}
