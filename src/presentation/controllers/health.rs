//! Health check controller

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::json;

use crate::presentation::controllers::AppState;
use crate::presentation::models::{HealthResponse, SourceHealth, SourcesHealthResponse};

/// Basic health check endpoint for liveness checks
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details: Some(json!({
            "build_date": option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown")
        })),
    })
}

/// Configured sources with the request budgets their clients run under
#[utoipa::path(
    get,
    path = "/health/sources",
    tag = "health",
    responses(
        (status = 200, description = "Source budgets", body = SourcesHealthResponse)
    )
)]
pub async fn sources_health(State(app_state): State<AppState>) -> Json<SourcesHealthResponse> {
    let service = &app_state.discovery_service;
    let sources = service
        .source_budgets()
        .into_iter()
        .map(|(source, budget)| SourceHealth {
            source: source.to_string(),
            max_requests: budget.map(|b| b.max_requests),
            window_ms: budget.map(|b| b.window_ms),
        })
        .collect();
    let enabled = service
        .discovery_config()
        .enabled_sources
        .iter()
        .map(ToString::to_string)
        .collect();

    Json(SourcesHealthResponse { sources, enabled })
}

/// Kubernetes liveness endpoint
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
