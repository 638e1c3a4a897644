//! Gateway request handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::downstream::{Behavior, Dependency};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::BreakerSnapshot;
use crate::orchestrator::Recommendations;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Recommendations>, ApiError> {
    let recommendations = state.orchestrator.get_recommendations(&user_id).await?;
    Ok(Json(recommendations))
}

pub async fn simulate(
    State(state): State<AppState>,
    Path((service, behavior)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let dependency: Dependency = service
        .parse()
        .map_err(|_| ApiError::UnknownService(service.clone()))?;
    let behavior: Behavior = behavior
        .parse()
        .map_err(|_| ApiError::UnknownBehavior(behavior.clone()))?;

    state.downstream.set_behavior(dependency, behavior).await?;

    Ok(Json(json!({ "service": dependency, "behavior": behavior })))
}

pub async fn circuit_breakers(State(state): State<AppState>) -> Json<BTreeMap<String, BreakerSnapshot>> {
    Json(state.reporter.snapshot())
}
