//! Research session: sub-queries in, ranked context out.
//!
//! A [`ResearchSession`] ties the retrieval core together for one research
//! task. For every sub-query it searches, drops URLs the session has already
//! claimed, scrapes the rest and hands the documents to a [`ContextRanker`].
//!
//! ```text
//! sub-query ─► SearchOrchestrator ─► VisitedUrls::filter_new ─► ScraperDispatcher
//!                                                                  │
//!                                   ContextRanker ◄── ScrapedDocument(s)
//! ```
//!
//! Sub-queries run concurrently. They share one [`VisitedUrls`] set, so a
//! page found by two sub-queries is scraped once, by whichever claims it first.

use std::sync::Arc;

use futures_util::future::try_join_all;
use scout_search::circuit_breaker::CircuitState;
use scout_search::{
    RateLimiter, RequestHeaders, RetrieverRegistry, ScrapedDocument, ScraperDispatcher,
    SearchOrchestrator, VisitedUrls,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{ResearchConfig, ScoutConfig};
use crate::error::Result;
use crate::ranker::{ContextRanker, PassthroughRanker, RankInput};

/// Documents and ranked context gathered for one sub-query.
#[derive(Debug, Clone, Serialize)]
pub struct SubQueryContext {
    /// The sub-query that was researched.
    pub sub_query: String,
    /// One document per newly claimed URL, in search-result order.
    pub documents: Vec<ScrapedDocument>,
    /// Ranker output for the successful documents.
    pub context: String,
}

/// Everything a research run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    /// The main research query.
    pub query: String,
    /// Per-sub-query results, in the order the sub-queries were given.
    pub contexts: Vec<SubQueryContext>,
    /// Every URL claimed by the session, sorted.
    pub visited_urls: Vec<String>,
}

impl ResearchReport {
    /// All sub-query contexts joined, skipping empty ones.
    pub fn combined_context(&self) -> String {
        self.contexts
            .iter()
            .map(|c| c.context.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// One research task's retrieval state.
#[derive(Clone)]
pub struct ResearchSession {
    orchestrator: SearchOrchestrator,
    dispatcher: Arc<ScraperDispatcher>,
    visited: VisitedUrls,
    ranker: Arc<dyn ContextRanker>,
    settings: ResearchConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ResearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchSession")
            .field("dispatcher", &self.dispatcher)
            .field("visited", &self.visited.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ResearchSession {
    /// Create a session using the built-in backends.
    ///
    /// `limiter` is the process-wide rate limiter; every session shares it.
    ///
    /// # Errors
    ///
    /// Returns a config error for invalid settings or an HTTP error if the
    /// client cannot be built.
    pub fn new(config: &ScoutConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        Self::with_registry(config, RetrieverRegistry::with_builtin(), limiter)
    }

    /// Create a session with a caller-supplied registry.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_registry(
        config: &ScoutConfig,
        registry: RetrieverRegistry,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        config.validate()?;
        let retrieval = &config.retrieval;
        let client = scout_search::http::build_client(retrieval)?;
        let dispatcher = ScraperDispatcher::new(retrieval, client.clone(), limiter);
        let orchestrator =
            SearchOrchestrator::new(Arc::new(registry), Arc::new(retrieval.clone()), client);

        Ok(Self {
            orchestrator,
            dispatcher: Arc::new(dispatcher),
            visited: VisitedUrls::new(),
            ranker: Arc::new(PassthroughRanker),
            settings: config.research.clone(),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the downstream ranker.
    #[must_use]
    pub fn with_ranker(mut self, ranker: Arc<dyn ContextRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    /// A session for a subtopic: same retrieval stack and visited set, so
    /// pages already used by the parent are not fetched again.
    pub fn subtopic(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    /// The session's visited-URL set.
    pub fn visited(&self) -> &VisitedUrls {
        &self.visited
    }

    /// The search orchestrator, for health reporting.
    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    /// Retrievers whose circuit is not closed, as
    /// `(name, state, consecutive_failures)` sorted by name.
    pub fn degraded_retrievers(&self) -> Vec<(String, CircuitState, u32)> {
        self.orchestrator
            .health_report()
            .into_iter()
            .filter(|(_, state, _)| *state != CircuitState::Closed)
            .collect()
    }

    /// Token that stops in-flight scraping when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Search one sub-query and scrape the URLs not yet visited.
    ///
    /// # Errors
    ///
    /// Propagates search errors: an unknown retriever in strict mode, or no
    /// retriever could be constructed. Scrape failures are reported in the
    /// documents.
    pub async fn scrape_sub_query(
        &self,
        sub_query: &str,
        headers: &RequestHeaders,
    ) -> Result<Vec<ScrapedDocument>> {
        let results = self
            .orchestrator
            .search(sub_query, headers, &self.settings.domains)
            .await?;
        let new_urls = self
            .visited
            .filter_new(results.into_iter().map(|result| result.href));
        tracing::info!(new = new_urls.len(), "scraping sub-query results");
        if new_urls.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .dispatcher
            .fetch_all_with_cancel(&new_urls, self.cancel.clone())
            .await)
    }

    /// Scrape specific URLs, skipping any the session already visited.
    pub async fn scrape_urls(&self, urls: &[String]) -> Vec<ScrapedDocument> {
        let new_urls = self.visited.filter_new(urls.iter().map(String::as_str));
        self.dispatcher
            .fetch_all_with_cancel(&new_urls, self.cancel.clone())
            .await
    }

    /// Research `query` through `sub_queries`.
    ///
    /// With no sub-queries the main query is researched alone; otherwise it
    /// is appended when `include_main_query` is set and not already listed.
    ///
    /// # Errors
    ///
    /// Returns the first sub-query search error.
    pub async fn conduct(
        &self,
        query: &str,
        sub_queries: &[String],
        headers: &RequestHeaders,
    ) -> Result<ResearchReport> {
        let plan = self.plan(query, sub_queries);
        tracing::info!(sub_queries = plan.len(), "research started");

        let contexts = try_join_all(
            plan.iter()
                .map(|sub_query| self.research_one(sub_query, headers)),
        )
        .await?;

        let report = ResearchReport {
            query: query.to_owned(),
            contexts,
            visited_urls: self.visited.snapshot(),
        };
        tracing::info!(visited = report.visited_urls.len(), "research finished");
        Ok(report)
    }

    fn plan(&self, query: &str, sub_queries: &[String]) -> Vec<String> {
        let mut plan: Vec<String> = Vec::with_capacity(sub_queries.len() + 1);
        for sub_query in sub_queries.iter().map(|q| q.trim()) {
            if !sub_query.is_empty() && !plan.iter().any(|q| q == sub_query) {
                plan.push(sub_query.to_owned());
            }
        }
        let query = query.trim();
        let missing = !plan.iter().any(|q| q == query);
        if plan.is_empty() || (self.settings.include_main_query && missing) {
            plan.push(query.to_owned());
        }
        plan
    }

    async fn research_one(
        &self,
        sub_query: &str,
        headers: &RequestHeaders,
    ) -> Result<SubQueryContext> {
        let documents = self.scrape_sub_query(sub_query, headers).await?;
        let inputs: Vec<RankInput> = documents
            .iter()
            .filter_map(RankInput::from_document)
            .collect();
        let context = if inputs.is_empty() {
            String::new()
        } else {
            self.ranker
                .rank(sub_query, &inputs, self.settings.max_context_chunks)
                .await
        };
        Ok(SubQueryContext {
            sub_query: sub_query.to_owned(),
            documents,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn session(include_main_query: bool) -> ResearchSession {
        let mut config = ScoutConfig::default();
        config.research.include_main_query = include_main_query;
        ResearchSession::new(&config, Arc::new(RateLimiter::new())).unwrap()
    }

    fn owned(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| (*q).to_owned()).collect()
    }

    #[test]
    fn plan_appends_main_query_once() {
        let s = session(true);
        assert_eq!(
            s.plan("rust async", &owned(&["tokio", " tokio ", "smol", ""])),
            owned(&["tokio", "smol", "rust async"])
        );
        assert_eq!(
            s.plan("tokio", &owned(&["tokio", "smol"])),
            owned(&["tokio", "smol"])
        );
    }

    #[test]
    fn plan_without_main_query() {
        let s = session(false);
        assert_eq!(s.plan("rust async", &owned(&["tokio"])), owned(&["tokio"]));
        assert_eq!(s.plan("rust async", &[]), owned(&["rust async"]));
    }

    #[test]
    fn subtopic_shares_visited_set() {
        let parent = session(true);
        let child = parent.subtopic();
        parent.visited().filter_new(["https://a.com"]);
        assert!(child.visited().contains("https://a.com"));
    }

    #[test]
    fn cancelling_parent_cancels_subtopic() {
        let parent = session(true);
        let child = parent.subtopic();
        parent.cancel_token().cancel();
        assert!(child.cancel_token().is_cancelled());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = ScoutConfig::default();
        config.retrieval.max_results = 0;
        assert!(ResearchSession::new(&config, Arc::new(RateLimiter::new())).is_err());
    }

    #[test]
    fn combined_context_skips_empty() {
        let report = ResearchReport {
            query: "q".into(),
            contexts: vec![
                SubQueryContext {
                    sub_query: "a".into(),
                    documents: Vec::new(),
                    context: "first".into(),
                },
                SubQueryContext {
                    sub_query: "b".into(),
                    documents: Vec::new(),
                    context: String::new(),
                },
                SubQueryContext {
                    sub_query: "c".into(),
                    documents: Vec::new(),
                    context: "third".into(),
                },
            ],
            visited_urls: Vec::new(),
        };
        assert_eq!(report.combined_context(), "first\n\nthird");
    }
}
