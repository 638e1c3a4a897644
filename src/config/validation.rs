//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, percentages within bounds)
//! - Check that addresses and URLs parse

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BreakerConfig, GatewayConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every problem rather than stopping at the first.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    let urls = [
        ("downstream.profile_url", &config.downstream.profile_url),
        ("downstream.catalog_url", &config.downstream.catalog_url),
        ("downstream.trending_url", &config.downstream.trending_url),
    ];
    for (field, raw) in urls {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                field,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
        }
    }
    if config.downstream.request_timeout_ms == 0 {
        errors.push(ValidationError::new("downstream.request_timeout_ms", "must be > 0"));
    }

    validate_breaker("breakers.profile", &config.breakers.profile, &mut errors);
    validate_breaker("breakers.catalog", &config.breakers.catalog, &mut errors);

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_breaker(prefix: &str, breaker: &BreakerConfig, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("{}.{}", prefix, name);

    if breaker.call_timeout_ms == 0 {
        errors.push(ValidationError::new(field("call_timeout_ms"), "must be > 0"));
    }
    if breaker.consecutive_failure_threshold == 0 {
        errors.push(ValidationError::new(field("consecutive_failure_threshold"), "must be > 0"));
    }
    let pct = breaker.failure_rate_percent_threshold;
    if !(pct > 0.0 && pct <= 100.0) {
        errors.push(ValidationError::new(
            field("failure_rate_percent_threshold"),
            format!("{} is outside (0, 100]", pct),
        ));
    }
    if breaker.failure_rate_window == 0 {
        errors.push(ValidationError::new(field("failure_rate_window"), "must be > 0"));
    }
    if breaker.half_open_trials_required == 0 {
        errors.push(ValidationError::new(field("half_open_trials_required"), "must be > 0"));
    }
}
