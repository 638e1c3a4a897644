//! HTTP client for the downstream collaborators.
//!
//! # Responsibilities
//! - Resolve endpoint URLs from the configured base URLs
//! - Fetch profile, catalog, and trending data as JSON
//! - Forward behavior injection requests to a collaborator
//!
//! Deadlines for breaker-protected calls are enforced by the breaker; the
//! transport timeout configured here is only an upper bound for everything
//! else (trending, behavior forwarding).

use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::DownstreamConfig;
use crate::downstream::types::{
    Behavior, Catalog, Dependency, DownstreamError, TrendingList, UserProfile,
};

/// The data the orchestrator composes a response from.
///
/// This is the seam between composition policy and transport: the HTTP
/// client implements it for production, tests substitute in-memory sources.
pub trait RecommendationSources: Send + Sync {
    fn fetch_profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<UserProfile, DownstreamError>>;

    fn fetch_catalog(&self) -> BoxFuture<'_, Result<Catalog, DownstreamError>>;

    fn fetch_trending(&self) -> BoxFuture<'_, Result<TrendingList, DownstreamError>>;
}

/// reqwest-backed client for all three collaborators.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: reqwest::Client,
    profile_url: Url,
    catalog_url: Url,
    trending_url: Url,
}

impl DownstreamClient {
    pub fn new(config: &DownstreamConfig) -> Result<Self, DownstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .no_proxy()
            .build()
            .map_err(DownstreamError::Client)?;

        Ok(Self {
            client,
            profile_url: parse_base(Dependency::UserProfile, &config.profile_url)?,
            catalog_url: parse_base(Dependency::ProductCatalog, &config.catalog_url)?,
            trending_url: parse_base(Dependency::Trending, &config.trending_url)?,
        })
    }

    pub fn base_url(&self, dependency: Dependency) -> &Url {
        match dependency {
            Dependency::UserProfile => &self.profile_url,
            Dependency::ProductCatalog => &self.catalog_url,
            Dependency::Trending => &self.trending_url,
        }
    }

    /// Ask a collaborator to switch to `behavior`.
    pub async fn set_behavior(
        &self,
        dependency: Dependency,
        behavior: Behavior,
    ) -> Result<(), DownstreamError> {
        let url = self.endpoint(dependency, &["simulate", behavior.as_str()])?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|source| DownstreamError::Request { dependency, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status {
                dependency,
                status: status.as_u16(),
            });
        }

        tracing::info!(dependency = %dependency, behavior = %behavior, "Collaborator behavior changed");
        Ok(())
    }

    fn endpoint(&self, dependency: Dependency, segments: &[&str]) -> Result<Url, DownstreamError> {
        let mut url = self.base_url(dependency).clone();
        url.path_segments_mut()
            .map_err(|_| DownstreamError::InvalidUrl {
                dependency,
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        dependency: Dependency,
        segments: &[&str],
    ) -> Result<T, DownstreamError> {
        let url = self.endpoint(dependency, segments)?;
        tracing::debug!(dependency = %dependency, url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownstreamError::Request { dependency, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status {
                dependency,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| DownstreamError::Request { dependency, source })
    }
}

impl RecommendationSources for DownstreamClient {
    fn fetch_profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<UserProfile, DownstreamError>> {
        async move { self.get_json(Dependency::UserProfile, &["profile", user_id]).await }.boxed()
    }

    fn fetch_catalog(&self) -> BoxFuture<'_, Result<Catalog, DownstreamError>> {
        async move { self.get_json(Dependency::ProductCatalog, &["catalog"]).await }.boxed()
    }

    fn fetch_trending(&self) -> BoxFuture<'_, Result<TrendingList, DownstreamError>> {
        async move { self.get_json(Dependency::Trending, &["trending"]).await }.boxed()
    }
}

fn parse_base(dependency: Dependency, raw: &str) -> Result<Url, DownstreamError> {
    Url::parse(raw).map_err(|e| DownstreamError::InvalidUrl {
        dependency,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(profile_url: &str) -> DownstreamClient {
        let config = DownstreamConfig {
            profile_url: profile_url.to_string(),
            ..DownstreamConfig::default()
        };
        DownstreamClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://profile.internal:8001");
        let url = client.endpoint(Dependency::UserProfile, &["profile", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://profile.internal:8001/profile/42");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_segments() {
        let client = client("http://gateway.internal/users/");
        let url = client
            .endpoint(Dependency::UserProfile, &["profile", "a b/c"])
            .unwrap();
        assert_eq!(url.as_str(), "http://gateway.internal/users/profile/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = DownstreamConfig {
            catalog_url: "not a url".to_string(),
            ..DownstreamConfig::default()
        };
        let err = DownstreamClient::new(&config).unwrap_err();
        assert!(matches!(
            err,
            DownstreamError::InvalidUrl { dependency: Dependency::ProductCatalog, .. }
        ));
    }
}
