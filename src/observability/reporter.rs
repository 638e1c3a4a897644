//! Read-only projection of circuit breaker counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::resilience::{CircuitBreaker, CircuitState};

/// Externally visible view of one breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    /// Percentage of failures in the current window, one decimal place.
    pub failure_rate_percent: String,
    pub total_successes: u64,
    pub consecutive_failures: u32,
}

/// Builds [`BreakerSnapshot`]s for a fixed set of breakers.
#[derive(Debug, Clone)]
pub struct MetricsReporter {
    breakers: Vec<Arc<CircuitBreaker>>,
}

impl MetricsReporter {
    pub fn new(breakers: Vec<Arc<CircuitBreaker>>) -> Self {
        Self { breakers }
    }

    /// Snapshot of every breaker keyed by dependency name. Never mutates breaker state.
    pub fn snapshot(&self) -> BTreeMap<String, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|breaker| {
                let stats = breaker.stats();
                let snapshot = BreakerSnapshot {
                    state: stats.state,
                    failure_rate_percent: format!("{:.1}", stats.failure_rate_percent),
                    total_successes: stats.total_successes,
                    consecutive_failures: stats.consecutive_failures,
                };
                (breaker.name().to_string(), snapshot)
            })
            .collect()
    }
}
