//! Trait definition for page scraping strategies.
//!
//! A strategy turns one URL into a [`ScrapeOutput`]. Strategies hold no
//! per-page state and are shared by every task of a dispatcher; the HTTP
//! client is passed per call.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ScrapeOutput, ScraperKind};

/// A way of extracting text and images from a URL.
#[async_trait]
pub trait ScraperStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> ScraperKind;

    /// Fetch and extract one page.
    ///
    /// Returning short or empty content is not an error; the dispatcher
    /// applies the minimum-length rule.
    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput>;
}
