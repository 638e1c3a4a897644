//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const ENV_PROFILE_URL: &str = "PROFILE_SERVICE_URL";
pub const ENV_CATALOG_URL: &str = "CATALOG_SERVICE_URL";
pub const ENV_TRENDING_URL: &str = "TRENDING_SERVICE_URL";
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (if given) or defaults, then process
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides looked up through `lookup` (the process environment in production).
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let targets = [
        (ENV_BIND_ADDRESS, &mut config.listener.bind_address),
        (ENV_PROFILE_URL, &mut config.downstream.profile_url),
        (ENV_CATALOG_URL, &mut config.downstream.catalog_url),
        (ENV_TRENDING_URL, &mut config.downstream.trending_url),
        (ENV_LOG_LEVEL, &mut config.observability.log_level),
    ];

    for (key, target) in targets {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(key, value = %value, "Applying environment override");
            *target = value;
        }
    }
}
