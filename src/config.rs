//! Application configuration loaded from TOML, with environment overrides.

use std::path::{Path, PathBuf};

use scout_search::RetrievalConfig;
use scout_search::config::split_names;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Top-level configuration for the scout application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Retrievers, scraper, worker pool and rate limiting.
    pub retrieval: RetrievalConfig,
    /// Research session settings.
    pub research: ResearchConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Settings for one research session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Paragraph budget handed to the ranker per sub-query.
    pub max_context_chunks: usize,
    /// Also research the main query alongside the supplied sub-queries.
    pub include_main_query: bool,
    /// Domains to restrict searches to. Empty means unrestricted.
    pub domains: Vec<String>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 10,
            include_main_query: true,
            domains: Vec::new(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    /// Directory for daily rolling log files. Stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl ScoutConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ScoutError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/scout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("scout")
            .join("config.toml")
    }

    /// Load from `path`, or from the default path when it exists, else defaults.
    /// Environment overrides are applied and the result validated.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded, an override
    /// does not parse, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] if a numeric or scraper value does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// `RETRIEVER` accepts a comma-separated list; a single name also
    /// becomes the primary retriever.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] naming the variable that did not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let retrieval = &mut self.retrieval;

        if let Some(raw) = get("RETRIEVER") {
            let names = split_names(&raw);
            if let [single] = names.as_slice() {
                retrieval.retriever = single.clone();
            }
            retrieval.retrievers = names;
        }
        if let Some(raw) = get("SCRAPER") {
            retrieval.scraper = raw.parse()?;
        }
        if let Some(raw) = get("MAX_SEARCH_RESULTS_PER_QUERY") {
            retrieval.max_results = parse_var("MAX_SEARCH_RESULTS_PER_QUERY", &raw)?;
        }
        if let Some(raw) = get("MAX_SCRAPER_WORKERS") {
            retrieval.max_workers = parse_var("MAX_SCRAPER_WORKERS", &raw)?;
        }
        if let Some(raw) = get("SCRAPER_RATE_LIMIT_DELAY") {
            retrieval.rate_limit_delay_secs = parse_var("SCRAPER_RATE_LIMIT_DELAY", &raw)?;
        }
        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] for the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.retrieval
            .validate()
            .map_err(|e| ScoutError::Config(e.to_string()))?;
        if self.research.max_context_chunks == 0 {
            return Err(ScoutError::Config(
                "research.max_context_chunks must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ScoutError::Config(format!("{var}={raw:?}: {e}")))
}
