//! arXiv export API. Needs no credential.
//!
//! The API answers with an Atom feed. The same parser backs the arXiv
//! scraper strategy.

use async_trait::async_trait;

use crate::error::{Result, RetrievalError};
use crate::http;
use crate::retriever::{RetrieverArgs, SearchRetriever};
use crate::types::SearchResult;

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org";

/// arXiv search client.
pub struct ArxivRetriever {
    args: RetrieverArgs,
    base_url: String,
}

/// Factory registered as `arxiv`.
///
/// # Errors
///
/// Never fails; the signature matches the registry's factory type.
pub fn from_args(args: RetrieverArgs) -> Result<Box<dyn SearchRetriever>> {
    let base_url = args.config.endpoint("arxiv", DEFAULT_BASE_URL);
    Ok(Box::new(ArxivRetriever { args, base_url }))
}

/// One `<entry>` of an arXiv Atom feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AtomEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/1706.03762v7`.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
}

#[async_trait]
impl SearchRetriever for ArxivRetriever {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn try_search(&self, max_results: usize) -> Result<Vec<SearchResult>> {
        tracing::trace!(query = %self.args.query, "arXiv search");

        let search_query = format!("all:{}", self.args.query);
        let max = max_results.to_string();
        let request = self
            .args
            .client
            .get(format!("{}/api/query", self.base_url))
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "relevance"),
            ]);

        let feed = http::fetch_text(request, "arXiv").await?;
        Ok(parse_atom_entries(&feed)?
            .into_iter()
            .map(|entry| SearchResult::new(entry.id, entry.summary, entry.title))
            .collect())
    }
}

/// Extract every entry from an arXiv Atom feed.
///
/// Entries without an id are skipped.
pub(crate) fn parse_atom_entries(feed: &str) -> Result<Vec<AtomEntry>> {
    let parsed = feed_rs::parser::parse(feed.as_bytes())
        .map_err(|e| RetrievalError::Parse(format!("arXiv feed: {e}")))?;

    Ok(parsed
        .entries
        .into_iter()
        .filter(|entry| !entry.id.trim().is_empty())
        .map(|entry| AtomEntry {
            id: entry.id.trim().to_owned(),
            title: entry.title.map(|t| clean_text(&t.content)).unwrap_or_default(),
            summary: entry
                .summary
                .map(|s| clean_text(&s.content))
                .unwrap_or_default(),
            authors: entry
                .authors
                .into_iter()
                .map(|person| clean_text(&person.name))
                .filter(|name| !name.is_empty())
                .collect(),
            published: entry
                .published
                .map(|at| at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        })
        .collect())
}

/// Collapse the line-wrapping whitespace arXiv puts inside titles and abstracts.
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::retrievers::test_support::mock_args;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const MOCK_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <id>http://arxiv.org/api/feed-id</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
      recurrent or convolutional neural networks &amp; attention.
    </summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1810.04805v2</id>
    <title>BERT</title>
    <summary>Pre-training of deep bidirectional transformers.</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_without_feed_header() {
        let entries = parse_atom_entries(MOCK_FEED).expect("feed should parse");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(first.title, "Attention Is All You Need");
        assert!(first.summary.starts_with("The dominant sequence"));
        assert!(first.summary.ends_with("networks & attention."));
        assert_eq!(first.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(first.published.as_deref(), Some("2017-06-12T17:57:34Z"));

        assert!(entries[1].authors.is_empty());
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let entries = parse_atom_entries(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
            .expect("should parse");
        assert!(entries.is_empty());
    }

    #[test]
    fn decodes_cdata_and_numeric_entities_in_attributed_entries() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/feed-id</id>
  <entry xmlns:arxiv="http://arxiv.org/schemas/atom">
    <id>http://arxiv.org/abs/1</id>
    <title>Schr&#246;dinger &#x2013; cats</title>
    <summary>Superposition.</summary>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2</id>
    <title><![CDATA[A & B]]></title>
    <summary>Conjunction.</summary>
  </entry>
</feed>"#;
        let entries = parse_atom_entries(feed).expect("feed should parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "http://arxiv.org/abs/1");
        assert_eq!(entries[0].title, "Schr\u{f6}dinger \u{2013} cats");
        assert_eq!(entries[1].title, "A & B");
    }

    #[test]
    fn malformed_feed_is_parse_error() {
        assert!(matches!(
            parse_atom_entries("not a feed"),
            Err(RetrievalError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn queries_export_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("search_query", "all:rust async runtime"))
            .and(query_param("max_results", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_FEED))
            .expect(1)
            .mount(&server)
            .await;

        let results = from_args(mock_args("arxiv", &server.uri(), &[]))
            .expect("no credential needed")
            .try_search(4)
            .await
            .expect("search should succeed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].href, "http://arxiv.org/abs/1810.04805v2");
        assert_eq!(results[1].title.as_deref(), Some("BERT"));
    }
}
