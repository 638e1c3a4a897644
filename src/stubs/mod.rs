//! Fixed-response downstream collaborators.
//!
//! Each stub serves one dependency: a health endpoint, a read endpoint with a
//! deterministic payload, and a behavior injection endpoint that switches the
//! read endpoint between normal, slow, and failing responses. They exist for
//! local runs (`stub-service` binary) and for end-to-end tests.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::downstream::{Behavior, Catalog, Dependency, Product, TrendingList, UserProfile};
use crate::lifecycle::shutdown;

/// Default delay applied by the `slow` behavior.
pub const DEFAULT_SLOW_DELAY: Duration = Duration::from_secs(5);

/// Shared state of a single stub.
#[derive(Debug)]
pub struct StubState {
    kind: Dependency,
    behavior: AtomicU8,
    slow_delay: Duration,
}

impl StubState {
    pub fn new(kind: Dependency, slow_delay: Duration) -> Self {
        Self {
            kind,
            behavior: AtomicU8::new(Behavior::Normal as u8),
            slow_delay,
        }
    }

    pub fn kind(&self) -> Dependency {
        self.kind
    }

    pub fn behavior(&self) -> Behavior {
        Behavior::from(self.behavior.load(Ordering::Relaxed))
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.behavior.store(behavior as u8, Ordering::Relaxed);
    }

    /// Apply the injected behavior ahead of a read. `Err` is the response to send instead.
    async fn gate(&self) -> Result<(), Response> {
        match self.behavior() {
            Behavior::Normal => Ok(()),
            Behavior::Slow => {
                tokio::time::sleep(self.slow_delay).await;
                Ok(())
            }
            Behavior::Fail => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{} simulated failure", self.kind) })),
            )
                .into_response()),
        }
    }
}

/// Build the router for a stub of `kind`.
pub fn router(state: Arc<StubState>) -> Router {
    let read = match state.kind() {
        Dependency::UserProfile => Router::new().route("/profile/{user_id}", get(get_profile)),
        Dependency::ProductCatalog => Router::new().route("/catalog", get(get_catalog)),
        Dependency::Trending => Router::new().route("/trending", get(get_trending)),
    };

    read.route("/health", get(health))
        .route("/simulate/{behavior}", post(simulate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve a stub until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: Arc<StubState>,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(
        service = %state.kind(),
        address = %listener.local_addr()?,
        "Stub service starting"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown::wait_for(shutdown))
        .await
}

async fn health(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": state.kind() }))
}

async fn simulate(
    State(state): State<Arc<StubState>>,
    Path(behavior): Path<String>,
) -> Response {
    match behavior.parse::<Behavior>() {
        Ok(behavior) => {
            state.set_behavior(behavior);
            tracing::info!(service = %state.kind(), behavior = %behavior, "Behavior injected");
            Json(json!({ "service": state.kind(), "behavior": behavior })).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

async fn get_profile(
    State(state): State<Arc<StubState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, Response> {
    state.gate().await?;
    Ok(Json(fixed_profile(&user_id)))
}

async fn get_catalog(State(state): State<Arc<StubState>>) -> Result<Json<Catalog>, Response> {
    state.gate().await?;
    Ok(Json(fixed_catalog()))
}

async fn get_trending(State(state): State<Arc<StubState>>) -> Result<Json<TrendingList>, Response> {
    state.gate().await?;
    Ok(Json(fixed_trending()))
}

pub fn fixed_profile(user_id: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        preferences: vec!["electronics".to_string(), "books".to_string()],
    }
}

pub fn fixed_catalog() -> Catalog {
    Catalog {
        products: vec![
            Product::new(1, "Wireless Headphones", "electronics"),
            Product::new(2, "Running Shoes", "sports"),
            Product::new(3, "The Rust Programming Language", "books"),
            Product::new(4, "Smart Watch", "electronics"),
            Product::new(5, "Yoga Mat", "sports"),
            Product::new(6, "Coffee Maker", "home"),
        ],
    }
}

pub fn fixed_trending() -> TrendingList {
    TrendingList {
        trending: vec![
            Product::new(101, "Portable Charger", "electronics"),
            Product::new(102, "Water Bottle", "sports"),
            Product::new(103, "Desk Lamp", "home"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_profile_stub_echoes_user_id() {
        let state = Arc::new(StubState::new(Dependency::UserProfile, DEFAULT_SLOW_DELAY));
        let (status, body) = call(router(state), Method::GET, "/profile/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "42");
        assert_eq!(body["preferences"][0], "electronics");
    }

    #[tokio::test]
    async fn test_fail_behavior_returns_500() {
        let state = Arc::new(StubState::new(Dependency::ProductCatalog, DEFAULT_SLOW_DELAY));
        let (status, _) = call(router(state.clone()), Method::POST, "/simulate/fail").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.behavior(), Behavior::Fail);

        let (status, body) = call(router(state), Method::GET, "/catalog").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "product-catalog simulated failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_behavior_delays_read() {
        let state = Arc::new(StubState::new(Dependency::Trending, Duration::from_secs(3)));
        state.set_behavior(Behavior::Slow);

        let start = tokio::time::Instant::now();
        let (status, body) = call(router(state), Method::GET, "/trending").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trending"].as_array().unwrap().len(), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_unknown_behavior_is_rejected() {
        let state = Arc::new(StubState::new(Dependency::Trending, DEFAULT_SLOW_DELAY));
        let (status, _) = call(router(state.clone()), Method::POST, "/simulate/bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.behavior(), Behavior::Normal);
    }

    #[tokio::test]
    async fn test_only_own_read_endpoint_is_routed() {
        let state = Arc::new(StubState::new(Dependency::Trending, DEFAULT_SLOW_DELAY));
        let response = router(state)
            .oneshot(Request::builder().uri("/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
