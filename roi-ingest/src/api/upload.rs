//! Upload API handlers
//!
//! POST /api/upload, GET /api/upload/status, POST /api/upload/reset

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use roi_common::FileInfo;
use serde::Serialize;

use crate::{
    error::{ApiError, ApiResult},
    models::UploadSession,
    AppState,
};

/// Multipart field carrying the dataset
const FILE_FIELD: &str = "file";

/// Session snapshot returned by every upload endpoint
#[derive(Debug, Serialize)]
pub struct UploadStatusResponse {
    #[serde(flatten)]
    pub session: UploadSession,
    /// File size for display ("1.5 KB")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_display: Option<String>,
}

impl From<UploadSession> for UploadStatusResponse {
    fn from(session: UploadSession) -> Self {
        let file_size_display = session.file.as_ref().map(FileInfo::display_size);
        Self {
            session,
            file_size_display,
        }
    }
}

/// POST /api/upload
///
/// Accepts one multipart `file` field and starts the transfer.
/// 202 with the session snapshot; 400 for a rejected file; 409 while another
/// upload is in flight.
pub async fn start_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadStatusResponse>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("File part has no file name".to_string()))?;
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read file part: {}", e)))?;

        upload = Some((FileInfo::new(file_name, bytes.len() as u64, content_type), bytes.to_vec()));
        break;
    }

    let (file, bytes) = upload
        .ok_or_else(|| ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD)))?;

    let ticket = state.ingestion.start_upload(file, bytes).await?;

    Ok((StatusCode::ACCEPTED, Json(ticket.session.into())))
}

/// GET /api/upload/status
pub async fn upload_status(State(state): State<AppState>) -> Json<UploadStatusResponse> {
    Json(state.ingestion.status().await.into())
}

/// POST /api/upload/reset
///
/// Cancels any in-flight request and returns the session to IDLE.
pub async fn reset_upload(State(state): State<AppState>) -> Json<UploadStatusResponse> {
    let session = state.ingestion.reset().await;
    tracing::info!(attempt = session.attempt, "Upload session reset");
    Json(session.into())
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(start_upload))
        .route("/api/upload/status", get(upload_status))
        .route("/api/upload/reset", post(reset_upload))
}
