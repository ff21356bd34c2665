//! Error types for the scout application layer.

use scout_search::RetrievalError;

/// Top-level error type for research sessions and configuration.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// Retrieval core error (backend resolution, client construction).
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Configuration file or override error.
    #[error("config error: {0}")]
    Config(String),

    /// Logging setup error.
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScoutError>;
