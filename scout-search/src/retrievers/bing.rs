//! Bing HTML results page. Needs no credential.
//!
//! Bing sometimes wraps result links in `/ck/a` click-tracking redirects
//! whose `u` parameter carries the target as `a1` + URL-safe base64.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use scraper::Html;
use url::Url;

use super::{element_text, selector};
use crate::error::Result;
use crate::http;
use crate::retriever::{site_query, RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://www.bing.com";

/// Bing HTML search scraper.
pub struct BingRetriever {
    args: RetrieverArgs,
    base_url: String,
}

/// Factory registered as `bing`.
///
/// # Errors
///
/// Never fails; the signature matches the registry's factory type.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let base_url = args.config.endpoint("bing", DEFAULT_BASE_URL);
    Ok(Box::new(BingRetriever { args, base_url }))
}

#[async_trait]
impl SearchRetriever for BingRetriever {
    fn name(&self) -> &'static str {
        "bing"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = site_query(&self.args.query, &self.args.domains);
        tracing::trace!(query = %query, "Bing search");

        let count = max_results.to_string();
        let request = self
            .args
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("setlang", "en"),
                ("count", count.as_str()),
            ])
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9");

        let html = http::fetch_text(request, "Bing").await?;
        tracing::trace!(bytes = html.len(), "Bing response received");

        parse_bing_html(&html, max_results)
    }
}

/// Resolve a click-tracking link to its target; other links pass through.
fn decode_bing_url(href: &str) -> String {
    let Ok(parsed) = Url::parse(href) else {
        return href.to_owned();
    };
    let is_redirect = parsed
        .host_str()
        .is_some_and(|host| host.ends_with("bing.com"))
        && parsed.path().starts_with("/ck/a");
    if !is_redirect {
        return href.to_owned();
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "u")
        .and_then(|(_, value)| {
            let encoded = value.strip_prefix("a1")?.trim_end_matches('=').to_owned();
            let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
            String::from_utf8(bytes).ok()
        })
        .filter(|target| target.starts_with("http"))
        .unwrap_or_else(|| href.to_owned())
}

/// Parse a Bing results page into search results.
fn parse_bing_html(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_sel = selector("li.b_algo")?;
    let title_sel = selector("h2")?;
    let link_sel = selector("a")?;
    let snippet_sel = selector(".b_caption p, .b_lineclamp2")?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = element_text(title_el);
        if title.is_empty() {
            continue;
        }

        let href = title_el
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|h| !h.is_empty())
            .map(decode_bing_url);
        let Some(href) = href else {
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

    tracing::debug!(count = results.len(), "Bing results parsed");
    Ok(results)
}
