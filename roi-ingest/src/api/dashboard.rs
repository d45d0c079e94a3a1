//! Dashboard read endpoints
//!
//! GET /api/dashboard, GET /api/recommendations, GET /api/report

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use roi_common::{format_report, recommend, recommendations_for, report_filename, DataSource, RecommendationSet};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    /// Maximum number of items; the configured count when absent
    pub limit: Option<usize>,
}

/// GET /api/dashboard
///
/// `{"mode":"scored","summary":{...}}` after an ingestion, otherwise
/// `{"mode":"unscored"}`.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DataSource> {
    Json(state.ingestion.data_source().await)
}

/// GET /api/recommendations?limit=N
///
/// Data-driven once a dataset has been scored, the fixed heuristic list
/// before that.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Json<RecommendationSet> {
    let limit = query.limit.unwrap_or(state.config.recommendation_count);
    let source = state.ingestion.data_source().await;
    Json(recommendations_for(&source, limit))
}

/// GET /api/report
///
/// Plain-text report as a download. 404 until a dataset has been scored.
pub async fn get_report(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let source = state.ingestion.data_source().await;
    let summary = source
        .summary()
        .ok_or_else(|| ApiError::NotFound("No dataset has been analyzed yet".to_string()))?;

    let today = Utc::now().date_naive();
    let recommendations = recommend(&summary.campaigns, state.config.recommendation_count);
    let report = format_report(summary, &recommendations, today);
    let disposition = format!("attachment; filename=\"{}\"", report_filename(today));

    tracing::debug!(bytes = report.len(), "Report generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report,
    ))
}

/// Build dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/recommendations", get(get_recommendations))
        .route("/api/report", get(get_report))
}
