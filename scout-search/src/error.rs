//! Error types for the scout-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or sensitive data appear in
//! error messages.

/// Errors that can occur while retrieving or scraping sources.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// No resolved retriever could be constructed or queried.
    #[error("all retrievers failed: {0}")]
    AllRetrieversFailed(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a backend or page failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a backend response or page body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A backend needs a credential that is not configured.
    #[error("missing credential {0}")]
    MissingCredential(String),

    /// A scraper strategy failed to extract content.
    #[error("scrape error: {0}")]
    Scrape(String),
}

/// Convenience type alias for scout-search results.
pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_retrievers_failed() {
        let err = RetrievalError::AllRetrieversFailed("tavily: missing credential".into());
        assert_eq!(
            err.to_string(),
            "all retrievers failed: tavily: missing credential"
        );
    }

    #[test]
    fn display_timeout() {
        let err = RetrievalError::Timeout("exceeded 8s limit".into());
        assert_eq!(err.to_string(), "timed out: exceeded 8s limit");
    }

    #[test]
    fn display_http() {
        let err = RetrievalError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_parse() {
        let err = RetrievalError::Parse("unexpected HTML structure".into());
        assert_eq!(err.to_string(), "parse error: unexpected HTML structure");
    }

    #[test]
    fn display_config() {
        let err = RetrievalError::Config("max_results must be > 0".into());
        assert_eq!(err.to_string(), "config error: max_results must be > 0");
    }

    #[test]
    fn display_missing_credential() {
        let err = RetrievalError::MissingCredential("TAVILY_API_KEY".into());
        assert_eq!(err.to_string(), "missing credential TAVILY_API_KEY");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RetrievalError>();
    }
}
