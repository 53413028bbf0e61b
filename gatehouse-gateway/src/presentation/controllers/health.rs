//! Liveness endpoint

use axum::{extract::State, response::Json};
use chrono::Utc;

use crate::presentation::models::HealthResponse;

/// Backends reported by the health endpoint
#[derive(Clone, Debug)]
pub struct HealthState {
    pub rate_limiter_backend: &'static str,
    pub cache_backend: &'static str,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details: Some(serde_json::json!({
            "rate_limiter": state.rate_limiter_backend,
            "cache": state.cache_backend,
        })),
    })
}
