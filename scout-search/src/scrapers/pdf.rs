//! PDF scraper. Downloads the document and extracts its text layer.
//!
//! Parsing is CPU-bound and synchronous, so it runs on the blocking thread
//! pool through [`WorkerPool::run_blocking`]. Parser panics on malformed
//! files surface as scrape errors.

use std::borrow::Cow;

use async_trait::async_trait;

use crate::error::{Result, RetrievalError};
use crate::http;
use crate::scraper::ScraperStrategy;
use crate::types::{ScrapeOutput, ScraperKind};
use crate::worker_pool::WorkerPool;

/// Text extraction for `.pdf` URLs.
#[derive(Clone)]
pub struct PdfScraper {
    pool: WorkerPool,
}

impl PdfScraper {
    /// A scraper whose parsing is bounded by `pool`'s blocking slots.
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScraperStrategy for PdfScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::Pdf
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let bytes = http::fetch_bytes(client.get(url), "PDF").await?;
        tracing::trace!(url, bytes = bytes.len(), "PDF downloaded");

        let text = self
            .pool
            .run_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await?
            .map_err(|e| RetrievalError::Scrape(format!("PDF text extraction failed: {e}")))?;

        Ok(ScrapeOutput {
            content: tidy_pdf_text(&text),
            images: Vec::new(),
            title: title_from_url(url),
        })
    }
}

/// Trim lines and collapse the blank runs the text layer leaves between blocks.
fn tidy_pdf_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_owned()
}

/// The file name without extension, or empty.
fn title_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_owned)
        })
        .map(|name| {
            let decoded = percent_decode(&name);
            decoded
                .strip_suffix(".pdf")
                .or_else(|| decoded.strip_suffix(".PDF"))
                .unwrap_or(&decoded)
                .to_owned()
        })
        .unwrap_or_default()
}

/// Path segments keep `+` literal; invalid UTF-8 leaves the segment as is.
fn percent_decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::rate_limit::RateLimiter;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper() -> PdfScraper {
        PdfScraper::new(WorkerPool::new(2, Duration::ZERO, Arc::new(RateLimiter::new())))
    }

    #[test]
    fn title_is_file_stem() {
        assert_eq!(title_from_url("https://e.com/papers/Attention%20Paper.pdf"), "Attention Paper");
        assert_eq!(title_from_url("https://e.com/REPORT.PDF"), "REPORT");
        assert_eq!(title_from_url("https://e.com/"), "");
    }

    #[test]
    fn plus_stays_literal_and_bad_utf8_kept_raw() {
        assert_eq!(title_from_url("https://e.com/a%20b+c.pdf"), "a b+c");
        assert_eq!(title_from_url("https://e.com/caf%C3%A9.pdf"), "café");
        assert_eq!(title_from_url("https://e.com/bad%FF.pdf"), "bad%FF");
    }

    #[test]
    fn tidy_collapses_blank_runs() {
        assert_eq!(tidy_pdf_text("\n\nTitle  \n\n\n\nBody line\nnext\n\n"), "Title\n\nBody line\nnext");
    }

    #[tokio::test]
    async fn garbage_bytes_are_a_scrape_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"this is not a pdf".to_vec()),
            )
            .mount(&server)
            .await;

        let url = format!("{}/broken.pdf", server.uri());
        let result = scraper().scrape(&url, &reqwest::Client::new()).await;
        assert!(matches!(result, Err(RetrievalError::Scrape(_))));
    }

    #[tokio::test]
    async fn download_failure_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let url = format!("{}/paper.pdf", server.uri());
        let result = scraper().scrape(&url, &reqwest::Client::new()).await;
        assert!(matches!(result, Err(RetrievalError::Http(_))));
    }
}
