//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the breakers, orchestrator, and reporter from configuration
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, tracing, timeout, request metrics)
//! - Serve on a listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::downstream::{Dependency, DownstreamClient, DownstreamError};
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown;
use crate::observability::{metrics, MetricsReporter};
use crate::orchestrator::Orchestrator;
use crate::resilience::CircuitBreaker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub reporter: MetricsReporter,
    pub downstream: Arc<DownstreamClient>,
}

/// HTTP server for the recommendation gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server. Breakers are created here, once, and live as long
    /// as the server.
    pub fn new(config: GatewayConfig) -> Result<Self, DownstreamError> {
        let downstream = Arc::new(DownstreamClient::new(&config.downstream)?);

        let profile_breaker = Arc::new(CircuitBreaker::new(
            Dependency::UserProfile.as_str(),
            config.breakers.profile.clone(),
        ));
        let catalog_breaker = Arc::new(CircuitBreaker::new(
            Dependency::ProductCatalog.as_str(),
            config.breakers.catalog.clone(),
        ));

        let reporter = MetricsReporter::new(vec![profile_breaker.clone(), catalog_breaker.clone()]);
        let orchestrator = Arc::new(Orchestrator::new(
            downstream.clone(),
            profile_breaker,
            catalog_breaker,
            config.fallback.default_preferences.clone(),
        ));

        let state = AppState {
            orchestrator,
            reporter,
            downstream,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/recommendations/{user_id}", get(handlers::get_recommendations))
            .route("/simulate/{service}/{behavior}", post(handlers::simulate))
            .route("/metrics/circuit-breakers", get(handlers::circuit_breakers))
            .route_layer(middleware::from_fn(metrics::track_requests))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// A clone of the fully layered router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            profile_url = %self.config.downstream.profile_url,
            catalog_url = %self.config.downstream.catalog_url,
            trending_url = %self.config.downstream.trending_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
