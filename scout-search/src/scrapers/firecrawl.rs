//! Firecrawl scrape API, returning the page as markdown.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::http;
use crate::scraper::ScraperStrategy;
use crate::types::{ScrapeOutput, ScraperKind};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev/v1";

/// Managed scraping through Firecrawl.
#[derive(Debug, Clone)]
pub struct FirecrawlScraper {
    base_url: String,
    api_key: Option<String>,
}

impl FirecrawlScraper {
    /// Endpoint from `endpoints.firecrawl`; key from `FIRECRAWL_API_KEY`.
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            base_url: config.endpoint("firecrawl", DEFAULT_BASE_URL),
            api_key: config.credential("FIRECRAWL_API_KEY"),
        }
    }
}

#[derive(Deserialize)]
struct FirecrawlResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<FirecrawlData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct FirecrawlData {
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    metadata: Option<FirecrawlMetadata>,
}

#[derive(Deserialize)]
struct FirecrawlMetadata {
    #[serde(default)]
    title: Option<String>,
}

#[async_trait]
impl ScraperStrategy for FirecrawlScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::Firecrawl
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RetrievalError::MissingCredential("FIRECRAWL_API_KEY".into()))?;

        let request = client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({ "url": url, "formats": ["markdown"] }));
        let response: FirecrawlResponse = http::fetch_json(request, "Firecrawl").await?;

        let data = match (response.success, response.data) {
            (true, Some(data)) => data,
            (_, _) => {
                let reason = response.error.unwrap_or_else(|| "no data returned".into());
                return Err(RetrievalError::Scrape(format!("Firecrawl failed: {reason}")));
            }
        };

        Ok(ScrapeOutput {
            content: data.markdown,
            images: Vec::new(),
            title: data.metadata.and_then(|m| m.title).unwrap_or_default(),
        })
    }
}
