//! Scout: concurrent multi-source research retrieval.
//!
//! This crate turns a research query and its sub-queries into scraped,
//! ranked source material:
//! sub-query → search backends → new URLs → concurrent scrape → ranker
//!
//! # Architecture
//!
//! - **Retrieval core**: [`scout_search`] resolves search backends, merges
//!   their results and scrapes pages under a bounded worker pool and a
//!   process-wide rate limiter
//! - **Configuration**: [`ScoutConfig`] loads from TOML with environment
//!   overrides
//! - **Research sessions**: [`ResearchSession`] runs sub-queries concurrently
//!   over one visited-URL set and hands documents to a [`ContextRanker`]
//! - **Logging**: [`logging::init`] installs the tracing subscriber

pub mod config;
pub mod error;
pub mod logging;
pub mod ranker;
pub mod research;

pub use config::{LoggingConfig, ResearchConfig, ScoutConfig};
pub use error::{Result, ScoutError};
pub use ranker::{ContextRanker, PassthroughRanker, RankInput};
pub use research::{ResearchReport, ResearchSession, SubQueryContext};
