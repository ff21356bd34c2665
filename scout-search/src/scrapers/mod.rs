//! Scraper strategies.
//!
//! Each module provides a struct implementing
//! [`crate::scraper::ScraperStrategy`]. [`build_strategy`] maps a
//! [`ScraperKind`] to its implementation.

pub mod arxiv;
pub mod browser;
pub mod firecrawl;
pub mod html;
pub mod images;
pub mod pdf;
pub mod tavily_extract;

pub use arxiv::ArxivScraper;
pub use browser::BrowserScraper;
pub use firecrawl::FirecrawlScraper;
pub use html::StaticHtmlScraper;
pub use pdf::PdfScraper;
pub use tavily_extract::TavilyExtractScraper;

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::scraper::ScraperStrategy;
use crate::types::ScraperKind;
use crate::worker_pool::WorkerPool;

/// Construct the strategy for `kind`.
///
/// Strategies that need credentials read them here and report a missing
/// one per scrape, so an unconfigured service only fails its own URLs.
pub fn build_strategy(
    kind: ScraperKind,
    config: &RetrievalConfig,
    pool: &WorkerPool,
) -> Arc<dyn ScraperStrategy> {
    match kind {
        ScraperKind::Static => Arc::new(StaticHtmlScraper),
        ScraperKind::Browser => Arc::new(BrowserScraper::new(config)),
        ScraperKind::Pdf => Arc::new(PdfScraper::new(pool.clone())),
        ScraperKind::Arxiv => Arc::new(ArxivScraper::new(config)),
        ScraperKind::TavilyExtract => Arc::new(TavilyExtractScraper::new(config)),
        ScraperKind::Firecrawl => Arc::new(FirecrawlScraper::new(config)),
    }
}
