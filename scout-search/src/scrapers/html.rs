//! Static HTML scraper: one GET, boilerplate stripped, readable text kept.
//!
//! Parses raw HTML, removes non-content elements (scripts, styles,
//! navigation), finds the main content area, and returns clean text plus
//! the page's ranked images. [`extract_page`] is shared with the browser
//! strategy, which only differs in how the HTML is obtained.

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::images::score_images;
use crate::error::Result;
use crate::http;
use crate::scraper::ScraperStrategy;
use crate::types::{ScrapeOutput, ScraperKind};

/// Maximum characters of text kept per page.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements removed with their content before text extraction.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
];

/// Fetches the page with the shared client and parses it in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticHtmlScraper;

#[async_trait]
impl ScraperStrategy for StaticHtmlScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::Static
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let request = client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml");
        let html = http::fetch_text(request, "page").await?;
        tracing::trace!(url, bytes = html.len(), "page fetched");
        Ok(extract_page(&html, url))
    }
}

/// Extract title, readable text and ranked images from raw HTML.
///
/// Never fails; a page with no readable text yields empty content.
pub fn extract_page(html: &str, page_url: &str) -> ScrapeOutput {
    extract_page_with_limit(html, page_url, DEFAULT_MAX_CHARS)
}

/// Same as [`extract_page`] with a custom character limit.
pub fn extract_page_with_limit(html: &str, page_url: &str, max_chars: usize) -> ScrapeOutput {
    let full = Html::parse_document(html);
    let images = score_images(&full, page_url);
    let title = extract_title(&full);

    let cleaned = Html::parse_document(&strip_boilerplate_tags(html));
    let text = normalise_whitespace(&extract_main_text(&cleaned));

    ScrapeOutput {
        content: truncate_to_limit(&text, max_chars),
        images,
        title,
    }
}

/// The `<title>` text, trimmed; empty when absent.
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_owned()
}

/// Text of the first non-empty content root, falling back to `<body>`.
fn extract_main_text(document: &Html) -> String {
    let content_selectors = ["article", "main", "[role=\"main\"]", "body"];

    for selector_str in &content_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }

    String::new()
}

fn strip_boilerplate_tags(html: &str) -> String {
    BOILERPLATE_TAGS
        .iter()
        .fold(html.to_owned(), |acc, tag| strip_tag(&acc, tag))
}

/// Remove every `<tag ...>...</tag>`, matching the tag name case-insensitively.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let Some(offset) = lower[pos..].find(&open_tag) else {
            result.push_str(&html[pos..]);
            break;
        };
        let start = pos + offset;

        // `<nav` must not match `<navigate`.
        let after_tag = start + open_tag.len();
        if let Some(&next) = lower.as_bytes().get(after_tag) {
            if !matches!(next, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        pos = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => lower[start..]
                .find('>')
                .map_or(html.len(), |offset| start + offset + 1),
        };
    }

    result
}

/// Collapse runs of spaces to one and 3+ newlines to 2; trim every line.
fn normalise_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count: u32 = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            newline_count += 1;
            prev_was_space = false;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if ch.is_whitespace() {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(ch);
        }
    }

    result
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Cut to at most `max_chars` bytes at a char boundary.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_owned();
    }

    let mut end = max_chars;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    text[..end].to_owned()
}
