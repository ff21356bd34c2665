//! Serper: Google results through a managed JSON API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::require_credential;
use crate::error::Result;
use crate::http;
use crate::retriever::{site_query, RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Serper.dev search client.
pub struct SerperRetriever {
    args: RetrieverArgs,
    api_key: String,
    base_url: String,
}

/// Factory registered as `serper`.
///
/// # Errors
///
/// Fails with `MissingCredential` when `SERPER_API_KEY` is not set.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let api_key = require_credential(&args, "SERPER_API_KEY")?;
    let base_url = args.config.endpoint("serper", DEFAULT_BASE_URL);
    Ok(Box::new(SerperRetriever {
        args,
        api_key,
        base_url,
    }))
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperHit>,
}

#[derive(Deserialize)]
struct SerperHit {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchRetriever for SerperRetriever {
    fn name(&self) -> &'static str {
        "serper"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = site_query(&self.args.query, &self.args.domains);
        tracing::trace!(query = %query, "Serper search");

        let request = self
            .args
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": max_results }));

        let response: SerperResponse = http::fetch_json(request, "Serper").await?;
        Ok(response
            .organic
            .into_iter()
            .map(|hit| SearchResult::new(hit.link, hit.snippet, hit.title))
            .collect())
    }
}
