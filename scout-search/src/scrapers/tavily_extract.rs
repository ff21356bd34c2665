//! Tavily extract API: the service fetches and cleans the page.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::http;
use crate::scraper::ScraperStrategy;
use crate::types::{ImageCandidate, ScrapeOutput, ScraperKind};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Managed extraction through Tavily.
#[derive(Debug, Clone)]
pub struct TavilyExtractScraper {
    base_url: String,
    api_key: Option<String>,
}

impl TavilyExtractScraper {
    /// Shares the `tavily` endpoint override and `TAVILY_API_KEY`.
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            base_url: config.endpoint("tavily", DEFAULT_BASE_URL),
            api_key: config.credential("TAVILY_API_KEY"),
        }
    }
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractedPage>,
}

#[derive(Deserialize)]
struct ExtractedPage {
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

#[async_trait]
impl ScraperStrategy for TavilyExtractScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::TavilyExtract
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RetrievalError::MissingCredential("TAVILY_API_KEY".into()))?;

        let request = client
            .post(format!("{}/extract", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({ "urls": [url], "include_images": true }));
        let response: ExtractResponse = http::fetch_json(request, "Tavily extract").await?;

        let page = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Scrape("Tavily could not extract the page".into()))?;

        Ok(ScrapeOutput {
            content: page.raw_content.unwrap_or_default(),
            images: page
                .images
                .into_iter()
                .map(|url| ImageCandidate { url, score: 0 })
                .collect(),
            title: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, key: &str) -> RetrievalConfig {
        let mut config = RetrievalConfig::default();
        config.endpoints.insert("tavily".into(), server.uri());
        config.api_keys.insert("TAVILY_API_KEY".into(), key.into());
        config
    }

    #[tokio::test]
    async fn extracts_content_and_images() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .and(header("authorization", "Bearer tvly-x"))
            .and(body_partial_json(json!({"urls": ["https://a.com/post"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "url": "https://a.com/post",
                    "raw_content": "Cleaned article text.",
                    "images": ["https://a.com/1.png"]
                }],
                "failed_results": []
            })))
            .mount(&server)
            .await;

        let output = TavilyExtractScraper::new(&config_for(&server, "tvly-x"))
            .scrape("https://a.com/post", &reqwest::Client::new())
            .await
            .expect("extract should succeed");
        assert_eq!(output.content, "Cleaned article text.");
        assert_eq!(output.images.len(), 1);
    }

    #[tokio::test]
    async fn failed_extraction_is_scrape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [],
                "failed_results": [{"url": "https://a.com", "error": "blocked"}]
            })))
            .mount(&server)
            .await;

        let result = TavilyExtractScraper::new(&config_for(&server, "k"))
            .scrape("https://a.com", &reqwest::Client::new())
            .await;
        assert!(matches!(result, Err(RetrievalError::Scrape(_))));
    }

    #[tokio::test]
    async fn missing_key_fails_before_request() {
        let server = MockServer::start().await;
        let result = TavilyExtractScraper::new(&config_for(&server, ""))
            .scrape("https://a.com", &reqwest::Client::new())
            .await;
        assert!(matches!(result, Err(RetrievalError::MissingCredential(_))));
    }
}
