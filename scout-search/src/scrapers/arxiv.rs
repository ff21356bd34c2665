//! arXiv paper scraper. Looks the paper up by id in the export API and
//! returns its title, authors and abstract.

use async_trait::async_trait;
use url::Url;

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::http;
use crate::retrievers::arxiv::parse_atom_entries;
use crate::scraper::ScraperStrategy;
use crate::types::{ScrapeOutput, ScraperKind};

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org";

/// Metadata lookup for `arxiv.org` URLs.
#[derive(Debug, Clone)]
pub struct ArxivScraper {
    base_url: String,
}

impl ArxivScraper {
    /// Uses the `arxiv` endpoint override when configured.
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            base_url: config.endpoint("arxiv", DEFAULT_BASE_URL),
        }
    }
}

#[async_trait]
impl ScraperStrategy for ArxivScraper {
    fn kind(&self) -> ScraperKind {
        ScraperKind::Arxiv
    }

    async fn scrape(&self, url: &str, client: &reqwest::Client) -> Result<ScrapeOutput> {
        let id = paper_id(url)
            .ok_or_else(|| RetrievalError::Scrape("URL does not name an arXiv paper".into()))?;

        let request = client
            .get(format!("{}/api/query", self.base_url))
            .query(&[("id_list", id.as_str())]);
        let feed = http::fetch_text(request, "arXiv").await?;

        let entry = parse_atom_entries(&feed)?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Scrape(format!("arXiv has no entry for {id}")))?;

        let mut content = String::new();
        content.push_str(&entry.title);
        if !entry.authors.is_empty() {
            content.push_str("\n\nAuthors: ");
            content.push_str(&entry.authors.join(", "));
        }
        if let Some(published) = &entry.published {
            content.push_str("\nPublished: ");
            content.push_str(published);
        }
        content.push_str("\n\n");
        content.push_str(&entry.summary);

        Ok(ScrapeOutput {
            content: content.trim().to_owned(),
            images: Vec::new(),
            title: entry.title,
        })
    }
}

/// Paper id from an `/abs/`, `/pdf/` or `/html/` URL, e.g. `1706.03762v7`.
fn paper_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let kind = segments.next()?;
    if !matches!(kind, "abs" | "pdf" | "html") {
        return None;
    }
    // Old-style ids carry the archive name: `hep-th/9901001`.
    let id = segments.collect::<Vec<_>>().join("/");
    let id = id.strip_suffix(".pdf").unwrap_or(&id);
    (!id.is_empty()).then(|| id.to_owned())
}
