//! Core types for search results, scraped documents and scraper identification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RetrievalError;

/// Minimum number of characters of extracted text for a scrape to count.
pub const MIN_CONTENT_CHARS: usize = 100;

/// Maximum number of image candidates kept per document.
pub const MAX_IMAGES: usize = 10;

/// A single candidate returned by a search retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The candidate page URL.
    pub href: String,
    /// Snippet or raw text the backend returned for the page.
    pub body: String,
    /// Page title, when the backend supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SearchResult {
    /// Create a result with a title.
    pub fn new(href: impl Into<String>, body: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            href: href.into(),
            body: body.into(),
            title: (!title.trim().is_empty()).then_some(title),
        }
    }

    /// Create a result without a title.
    pub fn untitled(href: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            body: body.into(),
            title: None,
        }
    }
}

/// An image found on a scraped page, ranked by how likely it is to be
/// the page's primary illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    /// Absolute image URL.
    pub url: String,
    /// Heuristic score, 0 (barely qualifies) to 4 (layout hint).
    pub score: u8,
}

/// What a scraper strategy extracted from one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOutput {
    /// Extracted readable text.
    pub content: String,
    /// Scored image candidates, best first.
    pub images: Vec<ImageCandidate>,
    /// Page or paper title; may be empty.
    pub title: String,
}

/// The normalised outcome of one scrape attempt.
///
/// Every attempt, successful or not, produces exactly one document so
/// callers can correlate results back to the URLs they submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    /// The URL that was scraped.
    pub url: String,
    /// Extracted text; `None` when the attempt failed or the text was too short.
    pub raw_content: Option<String>,
    /// Scored image candidates, at most [`MAX_IMAGES`].
    pub image_urls: Vec<ImageCandidate>,
    /// Page title; empty when unknown.
    pub title: String,
    /// Whether the attempt produced usable content.
    pub success: bool,
}

impl ScrapedDocument {
    /// Build a document from strategy output, applying the length threshold.
    ///
    /// Content with fewer than [`MIN_CONTENT_CHARS`] characters (after
    /// trimming) is discarded and the document marked unsuccessful. Otherwise
    /// the content is kept verbatim.
    pub fn from_output(url: impl Into<String>, output: ScrapeOutput) -> Self {
        let url = url.into();
        let length = output.content.trim().chars().count();
        if length < MIN_CONTENT_CHARS {
            tracing::debug!(%url, length, "content below threshold");
            return Self {
                url,
                raw_content: None,
                image_urls: Vec::new(),
                title: output.title,
                success: false,
            };
        }

        let mut images = output.images;
        images.truncate(MAX_IMAGES);
        Self {
            url,
            raw_content: Some(output.content),
            image_urls: images,
            title: output.title,
            success: true,
        }
    }

    /// A document recording a failed attempt.
    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_content: None,
            image_urls: Vec::new(),
            title: String::new(),
            success: false,
        }
    }
}

/// Supported content-extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScraperKind {
    /// Static HTML fetch and parse.
    #[serde(rename = "bs")]
    Static,
    /// Rendered HTML from a headless-browser service.
    #[serde(rename = "browser")]
    Browser,
    /// PDF download and text extraction.
    #[serde(rename = "pdf")]
    Pdf,
    /// arXiv paper metadata and abstract.
    #[serde(rename = "arxiv")]
    Arxiv,
    /// Tavily Extract managed service.
    #[serde(rename = "tavily_extract")]
    TavilyExtract,
    /// Firecrawl managed scraping service.
    #[serde(rename = "firecrawl")]
    Firecrawl,
}

impl ScraperKind {
    /// Returns the configuration name of this strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "bs",
            Self::Browser => "browser",
            Self::Pdf => "pdf",
            Self::Arxiv => "arxiv",
            Self::TavilyExtract => "tavily_extract",
            Self::Firecrawl => "firecrawl",
        }
    }

    /// Returns all available strategy variants.
    pub fn all() -> &'static [ScraperKind] {
        &[
            Self::Static,
            Self::Browser,
            Self::Pdf,
            Self::Arxiv,
            Self::TavilyExtract,
            Self::Firecrawl,
        ]
    }
}

impl fmt::Display for ScraperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScraperKind {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bs" | "static" | "html" => Ok(Self::Static),
            "browser" | "browserless" => Ok(Self::Browser),
            "pdf" => Ok(Self::Pdf),
            "arxiv" => Ok(Self::Arxiv),
            "tavily_extract" => Ok(Self::TavilyExtract),
            "firecrawl" => Ok(Self::Firecrawl),
            other => Err(RetrievalError::Config(format!("unknown scraper: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(content: &str) -> ScrapeOutput {
        ScrapeOutput {
            content: content.to_owned(),
            images: vec![ImageCandidate {
                url: "https://example.com/a.png".into(),
                score: 2,
            }],
            title: "Example".into(),
        }
    }

    #[test]
    fn search_result_blank_title_becomes_none() {
        let result = SearchResult::new("https://example.com", "body", "   ");
        assert!(result.title.is_none());
        let result = SearchResult::new("https://example.com", "body", "Example");
        assert_eq!(result.title.as_deref(), Some("Example"));
    }

    #[test]
    fn search_result_serialises_without_missing_title() {
        let result = SearchResult::untitled("https://example.com", "body");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(!json.contains("title"));
        let decoded: SearchResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, result);
    }

    #[test]
    fn short_content_is_discarded() {
        let doc = ScrapedDocument::from_output("https://example.com", output(&"x".repeat(50)));
        assert!(!doc.success);
        assert!(doc.raw_content.is_none());
        assert!(doc.image_urls.is_empty());
        assert_eq!(doc.title, "Example");
    }

    #[test]
    fn long_content_is_kept_verbatim() {
        let content = "word ".repeat(100);
        let doc = ScrapedDocument::from_output("https://example.com", output(&content));
        assert!(doc.success);
        assert_eq!(doc.raw_content.as_deref(), Some(content.as_str()));
        assert_eq!(doc.image_urls.len(), 1);
    }

    #[test]
    fn threshold_counts_characters_not_bytes() {
        // 60 two-byte characters: 120 bytes, still below the threshold.
        let doc = ScrapedDocument::from_output("https://example.com", output(&"é".repeat(60)));
        assert!(!doc.success);
        let doc = ScrapedDocument::from_output("https://example.com", output(&"é".repeat(100)));
        assert!(doc.success);
    }

    #[test]
    fn whitespace_padding_does_not_count() {
        let content = format!("{}{}", " ".repeat(200), "x".repeat(10));
        let doc = ScrapedDocument::from_output("https://example.com", output(&content));
        assert!(!doc.success);
    }

    #[test]
    fn images_capped_at_max() {
        let images = (0..15)
            .map(|i| ImageCandidate {
                url: format!("https://example.com/{i}.png"),
                score: 1,
            })
            .collect();
        let doc = ScrapedDocument::from_output(
            "https://example.com",
            ScrapeOutput {
                content: "x".repeat(200),
                images,
                title: String::new(),
            },
        );
        assert_eq!(doc.image_urls.len(), MAX_IMAGES);
    }

    #[test]
    fn failed_document_shape() {
        let doc = ScrapedDocument::failed("https://example.com");
        assert_eq!(doc.url, "https://example.com");
        assert!(!doc.success);
        assert!(doc.raw_content.is_none());
        assert!(doc.title.is_empty());
    }

    #[test]
    fn scraper_kind_parse_aliases() {
        assert_eq!("bs".parse::<ScraperKind>().ok(), Some(ScraperKind::Static));
        assert_eq!("HTML".parse::<ScraperKind>().ok(), Some(ScraperKind::Static));
        assert_eq!(
            " browser ".parse::<ScraperKind>().ok(),
            Some(ScraperKind::Browser)
        );
        assert_eq!(
            "tavily_extract".parse::<ScraperKind>().ok(),
            Some(ScraperKind::TavilyExtract)
        );
        assert!("selenium".parse::<ScraperKind>().is_err());
    }

    #[test]
    fn scraper_kind_display_matches_name() {
        for kind in ScraperKind::all() {
            assert_eq!(kind.to_string(), kind.name());
            assert_eq!(kind.name().parse::<ScraperKind>().ok(), Some(*kind));
        }
    }

    #[test]
    fn scraper_kind_serde_uses_config_names() {
        let json = serde_json::to_string(&ScraperKind::Static).expect("serialize");
        assert_eq!(json, "\"bs\"");
        let decoded: ScraperKind = serde_json::from_str("\"firecrawl\"").expect("deserialize");
        assert_eq!(decoded, ScraperKind::Firecrawl);
    }
}
