//! Search retriever backends.
//!
//! Each module provides a struct implementing
//! [`crate::retriever::SearchRetriever`] and a `from_args` factory that the
//! [`crate::registry::RetrieverRegistry`] registers under the backend name.

pub mod arxiv;
pub mod bing;
pub mod custom;
pub mod duckduckgo;
pub mod google;
pub mod searx;
pub mod semantic_scholar;
pub mod serper;
pub mod tavily;

pub use arxiv::ArxivRetriever;
pub use bing::BingRetriever;
pub use custom::CustomRetriever;
pub use duckduckgo::DuckDuckGoRetriever;
pub use google::GoogleRetriever;
pub use searx::SearxRetriever;
pub use semantic_scholar::SemanticScholarRetriever;
pub use serper::SerperRetriever;
pub use tavily::TavilyRetriever;

use crate::error::RetrievalError;
use crate::retriever::RetrieverArgs;

/// Fetch a mandatory credential or fail construction.
pub(crate) fn require_credential(args: &RetrieverArgs, var: &str) -> Result<String, RetrievalError> {
    args.credential(var)
        .ok_or_else(|| RetrievalError::MissingCredential(var.to_owned()))
}

/// Parse a CSS selector, mapping failures to [`RetrievalError::Parse`].
pub(crate) fn selector(css: &str) -> Result<scraper::Selector, RetrievalError> {
    scraper::Selector::parse(css)
        .map_err(|e| RetrievalError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Collected, trimmed text of an element.
pub(crate) fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}
