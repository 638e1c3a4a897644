//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the recommendation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request deadline).
    pub listener: ListenerConfig,

    /// Downstream collaborator endpoints.
    pub downstream: DownstreamConfig,

    /// Per-dependency circuit breaker settings.
    pub breakers: BreakersConfig,

    /// Fallback values substituted for unavailable dependencies.
    pub fallback: FallbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on handling a single inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Base URLs of the downstream collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// User profile service.
    pub profile_url: String,

    /// Product catalog service.
    pub catalog_url: String,

    /// Trending service (not behind a breaker).
    pub trending_url: String,

    /// Transport-level timeout for every outbound HTTP request, in milliseconds.
    /// Breaker-protected calls are additionally bounded by their call timeout.
    pub request_timeout_ms: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            profile_url: "http://127.0.0.1:8001".to_string(),
            catalog_url: "http://127.0.0.1:8002".to_string(),
            trending_url: "http://127.0.0.1:8003".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl DownstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Breakers for the two protected dependencies.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BreakersConfig {
    pub profile: BreakerConfig,
    pub catalog: BreakerConfig,
}

/// Circuit breaker thresholds. Immutable once the breaker is built.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Deadline for a single protected call, in milliseconds.
    pub call_timeout_ms: u64,

    /// Consecutive failures (while closed) that open the circuit.
    pub consecutive_failure_threshold: u32,

    /// Failure percentage over a full window that opens the circuit.
    pub failure_rate_percent_threshold: f64,

    /// Number of most recent outcomes kept for the failure rate.
    pub failure_rate_window: usize,

    /// Time since the last failure before an open circuit admits a trial call.
    pub open_cooldown_ms: u64,

    /// Consecutive half-open successes needed to close the circuit.
    pub half_open_trials_required: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 2_000,
            consecutive_failure_threshold: 5,
            failure_rate_percent_threshold: 50.0,
            failure_rate_window: 10,
            open_cooldown_ms: 30_000,
            half_open_trials_required: 3,
        }
    }
}

impl BreakerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn open_cooldown(&self) -> Duration {
        Duration::from_millis(self.open_cooldown_ms)
    }
}

/// Fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Preferences used when the profile service is unavailable.
    pub default_preferences: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            default_preferences: vec!["electronics".to_string(), "home".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exposition endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
