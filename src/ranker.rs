//! Hand-off to the downstream context-ranking stage.
//!
//! Research sessions pass scraped documents to a [`ContextRanker`], which
//! condenses them into the context string a report writer consumes.
//! Relevance ranking itself lives outside this crate; [`PassthroughRanker`]
//! keeps sources in retrieval order and only enforces the chunk budget.

use async_trait::async_trait;
use scout_search::ScrapedDocument;
use serde::Serialize;

/// One source handed to a ranker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankInput {
    /// Source page URL.
    pub url: String,
    /// Extracted page text.
    pub raw_content: String,
    /// Page title; may be empty.
    pub title: String,
}

impl RankInput {
    /// Convert a successful document; unsuccessful ones yield `None`.
    pub fn from_document(document: &ScrapedDocument) -> Option<Self> {
        let content = document.raw_content.as_ref().filter(|_| document.success)?;
        Some(Self {
            url: document.url.clone(),
            raw_content: content.clone(),
            title: document.title.clone(),
        })
    }
}

/// Condenses scraped sources into context for one query.
#[async_trait]
pub trait ContextRanker: Send + Sync {
    /// Select at most `max_chunks` paragraphs relevant to `query`.
    async fn rank(&self, query: &str, sources: &[RankInput], max_chunks: usize) -> String;
}

/// Keeps sources and paragraphs in their original order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRanker;

#[async_trait]
impl ContextRanker for PassthroughRanker {
    async fn rank(&self, _query: &str, sources: &[RankInput], max_chunks: usize) -> String {
        let mut budget = max_chunks;
        let mut blocks = Vec::new();

        for source in sources {
            if budget == 0 {
                break;
            }
            let paragraphs: Vec<&str> = source
                .raw_content
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .take(budget)
                .collect();
            if paragraphs.is_empty() {
                continue;
            }
            budget -= paragraphs.len();

            let mut block = format!("Source: {}\n", source.url);
            if !source.title.is_empty() {
                block.push_str(&format!("Title: {}\n", source.title));
            }
            block.push_str("Content: ");
            block.push_str(&paragraphs.join("\n\n"));
            blocks.push(block);
        }

        blocks.join("\n\n")
    }
}
