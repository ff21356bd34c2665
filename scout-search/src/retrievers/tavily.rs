//! Tavily: managed search API built for research agents. The default backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::require_credential;
use crate::error::Result;
use crate::http;
use crate::retriever::{RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search API client.
pub struct TavilyRetriever {
    args: RetrieverArgs,
    api_key: String,
    base_url: String,
}

/// Factory registered as `tavily`.
///
/// # Errors
///
/// Fails with `MissingCredential` when `TAVILY_API_KEY` is not set.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let api_key = require_credential(&args, "TAVILY_API_KEY")?;
    let base_url = args.config.endpoint("tavily", DEFAULT_BASE_URL);
    Ok(Box::new(TavilyRetriever {
        args,
        api_key,
        base_url,
    }))
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'static str,
    topic: &'static str,
    max_results: usize,
    include_raw_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchRetriever for TavilyRetriever {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        tracing::trace!(query = %self.args.query, "Tavily search");

        let body = TavilyRequest {
            query: &self.args.query,
            search_depth: "basic",
            topic: "general",
            max_results,
            include_raw_content: false,
            include_domains: (!self.args.domains.is_empty()).then_some(self.args.domains.as_slice()),
        };
        let request = self
            .args
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: TavilyResponse = http::fetch_json(request, "Tavily").await?;
        Ok(response
            .results
            .into_iter()
            .map(|hit| SearchResult::new(hit.url, hit.content, hit.title))
            .collect())
    }
}
