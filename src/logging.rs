//! Tracing subscriber setup for the scout binary.
//!
//! Diagnostics always go to stderr so stdout stays clean for `--json`
//! output. A daily rolling file is added when `logging.directory` is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::LoggingConfig;
use crate::error::{Result, ScoutError};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "scout=info,scout_search=info";

/// File name prefix for rolling log files.
const LOG_FILE_PREFIX: &str = "scout.log";

/// The filter directive in effect: `RUST_LOG`, then config, then the default.
pub fn filter_directive(config: &LoggingConfig, from_env: Option<String>) -> String {
    from_env
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer.
///
/// # Errors
///
/// Returns [`ScoutError::Logging`] for an invalid filter or when a global
/// subscriber is already installed, and [`ScoutError::Io`] if the log
/// directory cannot be created.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let directive = filter_directive(config, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| ScoutError::Logging(format!("invalid filter {directive:?}: {e}")))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| ScoutError::Logging(e.to_string()))?;

    Ok(guard)
}
