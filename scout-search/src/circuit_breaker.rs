//! Per-retriever circuit breaker for adaptive backend selection.
//!
//! Tracks consecutive failures per retriever name and temporarily skips
//! backends that keep failing (missing quota, outages, blocked scrapers).
//! After a cooldown, a tripped backend enters a half-open state where the
//! next query decides whether to restore or re-trip it.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └────────┘             └────┬─────┘
//!     │                         ▲                      │
//!     │  success                │  failure              │
//!     └─────────────────────────┴──────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Circuit state for a single retriever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy; queries go through.
    Closed,
    /// Failed too often; skipped until the cooldown expires.
    Open,
    /// Cooldown elapsed; the next query is a probe.
    HalfOpen,
}

/// Health tracking data for one retriever.
#[derive(Debug, Clone)]
pub struct RetrieverHealth {
    /// Current circuit state.
    pub state: CircuitState,
    /// Consecutive failures since the last success.
    pub consecutive_failures: u32,
    /// When the last failure occurred.
    pub last_failure_at: Option<Instant>,
}

impl Default for RetrieverHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before a retriever is skipped.
    pub failure_threshold: u32,
    /// Seconds a tripped retriever is skipped before a probe is allowed.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

/// Per-retriever circuit breaker, keyed by registry name.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    retrievers: HashMap<String, RetrieverHealth>,
}

impl CircuitBreaker {
    /// Create a breaker with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            retrievers: HashMap::new(),
        }
    }

    /// Record a successful query; closes the circuit.
    pub fn record_success(&mut self, name: &str) {
        let health = self.retrievers.entry(name.to_owned()).or_default();
        if health.state != CircuitState::Closed {
            tracing::info!(retriever = name, "retriever recovered");
        }
        *health = RetrieverHealth::default();
    }

    /// Record a failed query; opens the circuit at the threshold.
    pub fn record_failure(&mut self, name: &str) {
        let health = self.retrievers.entry(name.to_owned()).or_default();
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.last_failure_at = Some(Instant::now());

        if health.consecutive_failures >= self.config.failure_threshold
            && health.state != CircuitState::Open
        {
            health.state = CircuitState::Open;
            tracing::warn!(
                retriever = name,
                failures = health.consecutive_failures,
                cooldown_secs = self.config.cooldown_secs,
                "retriever circuit opened"
            );
        }
    }

    /// Whether the retriever should be queried now.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open and
    /// allows one probe.
    pub fn should_attempt(&mut self, name: &str) -> bool {
        let cooldown = Duration::from_secs(self.config.cooldown_secs);
        let Some(health) = self.retrievers.get_mut(name) else {
            return true;
        };

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = health
                    .last_failure_at
                    .is_none_or(|at| at.elapsed() >= cooldown);
                if cooled {
                    health.state = CircuitState::HalfOpen;
                }
                cooled
            }
        }
    }

    /// Current state for `name`; unseen retrievers are closed.
    pub fn status(&self, name: &str) -> CircuitState {
        self.retrievers
            .get(name)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// `(name, state, consecutive_failures)` for every tracked retriever, sorted by name.
    pub fn health_report(&self) -> Vec<(String, CircuitState, u32)> {
        let mut report: Vec<_> = self
            .retrievers
            .iter()
            .map(|(name, health)| (name.clone(), health.state, health.consecutive_failures))
            .collect();
        report.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }
}
