//! Semantic Scholar academic graph search.
//!
//! Works without a key at a low shared rate limit; `SEMANTIC_SCHOLAR_API_KEY`
//! raises it when configured.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::http;
use crate::retriever::{RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org";
const FIELDS: &str = "title,abstract,url,venue,year,authors,isOpenAccess,openAccessPdf";

/// Semantic Scholar paper search client.
pub struct SemanticScholarRetriever {
    args: RetrieverArgs,
    api_key: Option<String>,
    base_url: String,
}

/// Factory registered as `semantic_scholar`.
///
/// # Errors
///
/// Never fails; the key is optional.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let api_key = args.credential("SEMANTIC_SCHOLAR_API_KEY");
    let base_url = args.config.endpoint("semantic_scholar", DEFAULT_BASE_URL);
    Ok(Box::new(SemanticScholarRetriever {
        args,
        api_key,
        base_url,
    }))
}

#[derive(Deserialize)]
struct PaperSearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    #[serde(default)]
    title: String,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Deserialize)]
struct OpenAccessPdf {
    #[serde(default)]
    url: Option<String>,
}

impl Paper {
    /// Prefer the open-access PDF so the scraper gets full text.
    fn into_result(self) -> Option<SearchResult> {
        let pdf = self
            .open_access_pdf
            .and_then(|pdf| pdf.url)
            .filter(|url| !url.is_empty());
        let href = pdf.or(self.url).filter(|url| !url.is_empty())?;
        Some(SearchResult::new(
            href,
            self.abstract_text.unwrap_or_default(),
            self.title,
        ))
    }
}

#[async_trait]
impl SearchRetriever for SemanticScholarRetriever {
    fn name(&self) -> &'static str {
        "semantic_scholar"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        tracing::trace!(query = %self.args.query, "Semantic Scholar search");

        let limit = max_results.to_string();
        let mut request = self
            .args
            .client
            .get(format!("{}/graph/v1/paper/search", self.base_url))
            .query(&[
                ("query", self.args.query.as_str()),
                ("limit", limit.as_str()),
                ("fields", FIELDS),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response: PaperSearchResponse = http::fetch_json(request, "Semantic Scholar").await?;
        Ok(response
            .data
            .into_iter()
            .filter_map(Paper::into_result)
            .collect())
    }
}
