//! Google Programmable Search (Custom Search JSON API).

use async_trait::async_trait;
use serde::Deserialize;

use super::require_credential;
use crate::error::Result;
use crate::http;
use crate::retriever::{site_query, RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// The API refuses `num` above this.
const MAX_PAGE_SIZE: usize = 10;

/// Custom Search API client.
pub struct GoogleRetriever {
    args: RetrieverArgs,
    api_key: String,
    cx: String,
    base_url: String,
}

/// Factory registered as `google`.
///
/// # Errors
///
/// Fails with `MissingCredential` when `GOOGLE_API_KEY` or `GOOGLE_CX_KEY`
/// is not set.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let api_key = require_credential(&args, "GOOGLE_API_KEY")?;
    let cx = require_credential(&args, "GOOGLE_CX_KEY")?;
    let base_url = args.config.endpoint("google", DEFAULT_BASE_URL);
    Ok(Box::new(GoogleRetriever {
        args,
        api_key,
        cx,
        base_url,
    }))
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchRetriever for GoogleRetriever {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = site_query(&self.args.query, &self.args.domains);
        tracing::trace!(query = %query, "Google search");

        let num = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self
            .args
            .client
            .get(format!("{}/customsearch/v1", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query.as_str()),
                ("start", "1"),
                ("num", num.as_str()),
            ]);

        let response: GoogleResponse = http::fetch_json(request, "Google").await?;
        Ok(response
            .items
            .into_iter()
            .map(|item| SearchResult::new(item.link, item.snippet, item.title))
            .collect())
    }
}
