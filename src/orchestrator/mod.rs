//! Recommendation orchestration.
//!
//! # Data Flow
//! ```text
//! GET /recommendations/{user_id}
//!     → profile breaker → fetch profile      (fallback: default preferences)
//!     → catalog breaker → fetch catalog      (fallback: empty catalog)
//!     → pick a branch from the breaker states after both calls
//!     → trending fetch (unprotected) when the catalog circuit is open
//! ```
//!
//! # Design Decisions
//! - Branch selection keys on breaker state, not on this request's outcome
//! - Dependency failures degrade the response; only a failed trending fetch
//!   is reported as an error
//! - Calls are sequential and never retried

pub mod composition;

use std::sync::Arc;

use thiserror::Error;

use crate::downstream::{Dependency, DownstreamError, Product, RecommendationSources};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitState};

pub use composition::{recommend, Recommendations};

/// Failures the composition policy has no further fallback for.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("trending source unavailable: {0}")]
    TrendingUnavailable(#[source] DownstreamError),
}

/// Composes profile and catalog data behind per-dependency circuit breakers.
pub struct Orchestrator {
    sources: Arc<dyn RecommendationSources>,
    profile_breaker: Arc<CircuitBreaker>,
    catalog_breaker: Arc<CircuitBreaker>,
    default_preferences: Vec<String>,
}

impl Orchestrator {
    pub fn new(
        sources: Arc<dyn RecommendationSources>,
        profile_breaker: Arc<CircuitBreaker>,
        catalog_breaker: Arc<CircuitBreaker>,
        default_preferences: Vec<String>,
    ) -> Self {
        Self {
            sources,
            profile_breaker,
            catalog_breaker,
            default_preferences,
        }
    }

    pub fn profile_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.profile_breaker
    }

    pub fn catalog_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.catalog_breaker
    }

    pub async fn get_recommendations(
        &self,
        user_id: &str,
    ) -> Result<Recommendations, OrchestratorError> {
        let sources = &self.sources;

        let preferences = match self
            .profile_breaker
            .execute(|| sources.fetch_profile(user_id))
            .await
        {
            Ok(profile) => profile.preferences,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Profile unavailable, using default preferences");
                metrics::record_fallback(Dependency::UserProfile.as_str());
                self.default_preferences.clone()
            }
        };

        let products = match self.catalog_breaker.execute(|| sources.fetch_catalog()).await {
            Ok(catalog) => catalog.products,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog unavailable, using empty catalog");
                metrics::record_fallback(Dependency::ProductCatalog.as_str());
                Vec::new()
            }
        };

        let profile_open = self.profile_breaker.state() == CircuitState::Open;
        let catalog_open = self.catalog_breaker.state() == CircuitState::Open;

        let response = match (profile_open, catalog_open) {
            (true, true) => {
                let trending = self.fetch_trending().await?;
                Recommendations::degraded(user_id, trending)
            }
            (true, false) => {
                let recommendations = recommend(&self.default_preferences, &products);
                Recommendations::profile_fallback(user_id, self.default_preferences.clone(), recommendations)
            }
            (false, true) => {
                let trending = self.fetch_trending().await?;
                Recommendations::catalog_fallback(user_id, preferences, trending)
            }
            (false, false) => {
                let recommendations = recommend(&preferences, &products);
                Recommendations::normal(user_id, preferences, recommendations)
            }
        };

        if let Some(fallback) = response.fallback_triggered_for() {
            tracing::info!(user_id, fallback, "Served degraded recommendations");
        }
        Ok(response)
    }

    async fn fetch_trending(&self) -> Result<Vec<Product>, OrchestratorError> {
        self.sources
            .fetch_trending()
            .await
            .map(|list| list.trending)
            .map_err(|e| {
                tracing::error!(error = %e, "Trending fetch failed with no further fallback");
                OrchestratorError::TrendingUnavailable(e)
            })
    }
}
