//! Name → factory lookup for retriever backends.
//!
//! The registry is built once (usually [`RetrieverRegistry::with_builtin`])
//! and shared read-only. [`resolve`](RetrieverRegistry::resolve) turns the
//! caller's headers and configuration into an ordered, non-empty list of
//! factories.

use std::collections::BTreeMap;

use crate::config::{split_names, RetrievalConfig, DEFAULT_RETRIEVER};
use crate::error::{Result, RetrievalError};
use crate::retriever::{header, RequestHeaders, RetrieverFactory};
use crate::retrievers;

/// A factory chosen for a session, with the name it is registered under.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRetriever {
    /// Registry name of the backend.
    pub name: &'static str,
    /// Constructor for one query.
    pub factory: RetrieverFactory,
}

/// Registered retriever backends.
#[derive(Debug, Clone, Default)]
pub struct RetrieverRegistry {
    factories: BTreeMap<&'static str, RetrieverFactory>,
}

impl RetrieverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in backend.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("tavily", retrievers::tavily::from_args);
        registry.register("serper", retrievers::serper::from_args);
        registry.register("google", retrievers::google::from_args);
        registry.register("bing", retrievers::bing::from_args);
        registry.register("duckduckgo", retrievers::duckduckgo::from_args);
        registry.register("searx", retrievers::searx::from_args);
        registry.register("arxiv", retrievers::arxiv::from_args);
        registry.register("semantic_scholar", retrievers::semantic_scholar::from_args);
        registry.register("custom", retrievers::custom::from_args);
        registry
    }

    /// Register (or replace) a backend. Names are matched case-insensitively,
    /// so register them in lowercase.
    pub fn register(&mut self, name: &'static str, factory: RetrieverFactory) {
        self.factories.insert(name, factory);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Look up one backend by name.
    pub fn get(&self, name: &str) -> Option<ResolvedRetriever> {
        let wanted = name.trim().to_ascii_lowercase();
        self.factories
            .get_key_value(wanted.as_str())
            .map(|(name, factory)| ResolvedRetriever {
                name: *name,
                factory: *factory,
            })
    }

    /// Resolve the backends to query, in priority order.
    ///
    /// Precedence, first non-empty wins:
    /// 1. header `retrievers` (comma-separated)
    /// 2. header `retriever`
    /// 3. `config.retrievers`
    /// 4. `config.retriever`
    /// 5. the default backend
    ///
    /// Unknown names fall back to the default backend with a warning, or
    /// fail when `config.strict_retriever_names` is set. Duplicates keep
    /// their first position. The result is never empty.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Config`] for an unknown name in strict mode, or
    /// when the default backend itself is not registered.
    pub fn resolve(
        &self,
        headers: &RequestHeaders,
        config: &RetrievalConfig,
    ) -> Result<Vec<ResolvedRetriever>> {
        let names = requested_names(headers, config);

        let mut resolved: Vec<ResolvedRetriever> = Vec::with_capacity(names.len());
        for name in &names {
            let entry = match self.get(name) {
                Some(entry) => entry,
                None if config.strict_retriever_names => {
                    return Err(RetrievalError::Config(format!(
                        "unknown retriever {name}; known: {}",
                        self.names().join(", ")
                    )));
                }
                None => {
                    tracing::warn!(
                        retriever = %name,
                        fallback = DEFAULT_RETRIEVER,
                        "unknown retriever, using default"
                    );
                    self.default_retriever()?
                }
            };
            if !resolved.iter().any(|r| r.name == entry.name) {
                resolved.push(entry);
            }
        }

        if resolved.is_empty() {
            resolved.push(self.default_retriever()?);
        }
        tracing::debug!(
            retrievers = ?resolved.iter().map(|r| r.name).collect::<Vec<_>>(),
            "retrievers resolved"
        );
        Ok(resolved)
    }

    fn default_retriever(&self) -> Result<ResolvedRetriever> {
        self.get(DEFAULT_RETRIEVER).ok_or_else(|| {
            RetrievalError::Config(format!("default retriever {DEFAULT_RETRIEVER} is not registered"))
        })
    }
}

/// The first non-empty name list by precedence.
fn requested_names(headers: &RequestHeaders, config: &RetrievalConfig) -> Vec<String> {
    let candidates = [
        header(headers, "retrievers").map(split_names),
        header(headers, "retriever").map(split_names),
        Some(
            config
                .retrievers
                .iter()
                .flat_map(|name| split_names(name))
                .collect(),
        ),
        Some(split_names(&config.retriever)),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|names| !names.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_RETRIEVER.to_owned()])
}
