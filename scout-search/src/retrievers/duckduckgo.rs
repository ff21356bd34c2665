//! DuckDuckGo HTML results page. Needs no credential.
//!
//! Uses the HTML-only version at `https://html.duckduckgo.com/html/`
//! which requires no JavaScript and is tolerant of automated requests.

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::{element_text, selector};
use crate::error::Result;
use crate::http;
use crate::retriever::{site_query, RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

/// DuckDuckGo HTML search scraper.
pub struct DuckDuckGoRetriever {
    args: RetrieverArgs,
    base_url: String,
}

/// Factory registered as `duckduckgo`.
///
/// # Errors
///
/// Never fails; the signature matches the registry's factory type.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let base_url = args.config.endpoint("duckduckgo", DEFAULT_BASE_URL);
    Ok(Box::new(DuckDuckGoRetriever { args, base_url }))
}

/// Extract the target URL from DuckDuckGo's redirect wrapper.
///
/// DDG wraps URLs like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
fn extract_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_owned()
    };

    let parsed = Url::parse(&full_href).ok()?;

    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(full_href)
    }
}

#[async_trait]
impl SearchRetriever for DuckDuckGoRetriever {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = site_query(&self.args.query, &self.args.domains);
        tracing::trace!(query = %query, "DuckDuckGo search");

        let request = self
            .args
            .client
            .post(format!("{}/html/", self.base_url))
            .form(&[("q", query.as_str())])
            .header("Accept-Language", "en-US,en;q=0.9");

        let html = http::fetch_text(request, "DuckDuckGo").await?;
        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        parse_duckduckgo_html(&html, max_results)
    }
}

/// Parse a DuckDuckGo results page, skipping ads.
pub(crate) fn parse_duckduckgo_html(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_sel = selector(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = element_text(title_el);
        if title.is_empty() {
            continue;
        }

        let Some(href) = title_el.value().attr("href").and_then(extract_url) else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        results.push(SearchResult::new(href, snippet, title));

        if results.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
    Ok(results)
}
