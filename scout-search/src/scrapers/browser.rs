//! Headless-browser scraper backed by a Browserless `/content` endpoint.
//!
//! The service renders the page (running its JavaScript) and returns the
//! final HTML, which is then extracted like a static page.

use async_trait::async_trait;
use serde_json::json;

use super::html::extract_page;
use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::http;
use crate::scraper::ScraperStrategy;
use crate::types::{ScrapeOutput, ScraperKind};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Rendered-page scraper.
#[derive(Debug, Clone)]
pub struct BrowserScraper {
    base_url: String,
    token: Option<String>,
}

impl BrowserScraper {
    /// Endpoint from `endpoints.browser`; token from `BROWSERLESS_TOKEN`.
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            base_url: config.endpoint("browser", DEFAULT_BASE_URL),
            token: config.credential("BROWSERLESS_TOKEN"),
        }
    }
}

#[async_trait]
impl ScraperStrategy for BrowserScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::Browser
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let mut request = client
            .post(format!("{}/content", self.base_url))
            .json(&json!({ "url": url }));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let html = http::fetch_text(request, "Browserless").await?;
        if html.trim().is_empty() {
            tracing::warn!(url, scraper = "browser", "empty HTML response");
        }
        Ok(extract_page(&html, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn renders_through_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .and(query_param("token", "bl-token"))
            .and(body_json(json!({"url": "https://spa.example.com/app"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>SPA</title></head><body><main>Rendered by JavaScript</main></body></html>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = RetrievalConfig::default();
        config.endpoints.insert("browser".into(), server.uri());
        config.api_keys.insert("BROWSERLESS_TOKEN".into(), "bl-token".into());

        let output = BrowserScraper::new(&config)
            .scrape("https://spa.example.com/app", &reqwest::Client::new())
            .await
            .expect("render should succeed");
        assert_eq!(output.title, "SPA");
        assert_eq!(output.content, "Rendered by JavaScript");
    }
}
