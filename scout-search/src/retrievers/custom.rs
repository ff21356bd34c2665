//! Caller-operated HTTP search endpoint.
//!
//! `RETRIEVER_ENDPOINT` names the URL. Every `RETRIEVER_ARG_<NAME>` entry
//! (from `api_keys` or the environment) is forwarded as a lowercased
//! `<name>` query parameter next to `query`. The endpoint answers with a
//! JSON list of `{url, raw_content}` objects.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::require_credential;
use crate::error::Result;
use crate::http;
use crate::retriever::{RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const ARG_PREFIX: &str = "RETRIEVER_ARG_";

/// Client for a user-provided search endpoint.
pub struct CustomRetriever {
    args: RetrieverArgs,
    endpoint: String,
    params: BTreeMap<String, String>,
}

/// Factory registered as `custom`.
///
/// # Errors
///
/// Fails with `MissingCredential` when `RETRIEVER_ENDPOINT` is not set.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let endpoint = require_credential(&args, "RETRIEVER_ENDPOINT")?;
    let params = forwarded_params(
        args.config
            .api_keys
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .chain(std::env::vars()),
    );
    Ok(Box::new(CustomRetriever {
        args,
        endpoint,
        params,
    }))
}

/// Collect `RETRIEVER_ARG_*` pairs; earlier entries win.
fn forwarded_params<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut params = BTreeMap::new();
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ARG_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        params.entry(name.to_lowercase()).or_insert(value);
    }
    params
}

#[derive(Deserialize)]
struct CustomHit {
    url: String,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[async_trait]
impl SearchRetriever for CustomRetriever {
    fn name(&self) -> &'static str {
        "custom"
    }

    async fn try_search(&self, _max_results: usize) -> Result<Vec<SearchResult>> {
        tracing::trace!(query = %self.args.query, "custom endpoint search");

        let mut query: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        query.push(("query", self.args.query.as_str()));

        let request = self.args.client.get(&self.endpoint).query(&query);
        let hits: Vec<CustomHit> = http::fetch_json(request, "custom retriever").await?;
        Ok(hits
            .into_iter()
            .map(|hit| {
                let body = hit.raw_content.unwrap_or_default();
                match hit.title {
                    Some(title) => SearchResult::new(hit.url, body, title),
                    None => SearchResult::untitled(hit.url, body),
                }
            })
            .collect())
    }
}
