//! SearxNG metasearch instance, queried through its JSON output format.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, RetrievalError};
use crate::http;
use crate::retriever::{site_query, RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

/// SearxNG client bound to one instance.
pub struct SearxRetriever {
    args: RetrieverArgs,
    base_url: String,
}

/// Factory registered as `searx`.
///
/// The instance URL comes from `SEARX_URL` or an `endpoints.searx` override.
///
/// # Errors
///
/// Fails with `MissingCredential` when neither is set.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let base_url = args
        .credential("SEARX_URL")
        .or_else(|| args.config.endpoints.get("searx").cloned())
        .map(|url| url.trim().trim_end_matches('/').to_owned())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| RetrievalError::MissingCredential("SEARX_URL".into()))?;
    Ok(Box::new(SearxRetriever { args, base_url }))
}

#[derive(Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxHit>,
}

#[derive(Deserialize)]
struct SearxHit {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchRetriever for SearxRetriever {
    fn name(&self) -> &'static str {
        "searx"
    }

    async fn try_search(&self, _max_results: usize) -> Result<Vec<SearchResult>> {
        let query = site_query(&self.args.query, &self.args.domains);
        tracing::trace!(query = %query, "SearxNG search");

        let request = self
            .args
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.as_str()), ("format", "json")]);

        let response: SearxResponse = http::fetch_json(request, "SearxNG").await?;
        Ok(response
            .results
            .into_iter()
            .map(|hit| SearchResult::new(hit.url, hit.content, hit.title))
            .collect())
    }
}
