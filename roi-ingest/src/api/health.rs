//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::PredictorHealth;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the predictor cannot be reached
    pub status: String,
    /// Module name ("roi-ingest")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    pub git_hash: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Last error message if any (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub predictor_reachable: bool,
    /// Reported by the predictor; absent when it could not be asked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
}

/// GET /health
///
/// Always 200. The predictor check is best effort and only affects the
/// `status` string.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    let (predictor_reachable, model_loaded) = match state.ingestion.predictor_health().await {
        Ok(health) => (true, Some(health.model_loaded)),
        Err(e) => {
            tracing::debug!(error = %e, "Predictor health check failed");
            (false, None)
        }
    };

    Json(HealthResponse {
        status: if predictor_reachable { "ok" } else { "degraded" }.to_string(),
        module: "roi-ingest".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        uptime_seconds,
        last_error,
        predictor_reachable,
        model_loaded,
    })
}

/// GET /api/predictor/health
///
/// Predictor's own health body; 502 when it cannot be reached.
pub async fn predictor_health(State(state): State<AppState>) -> ApiResult<Json<PredictorHealth>> {
    Ok(Json(state.ingestion.predictor_health().await?))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/predictor/health", get(predictor_health))
}
