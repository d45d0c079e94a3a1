//! PredictorClient tests against an in-process mock predictor
//!
//! Each test binds an axum server on 127.0.0.1:0 that answers `/predict`
//! and `/health` with a canned response.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use roi_ingest::services::{FileUpload, Predictor, PredictorClient, PredictorError};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone)]
struct MockPredictor {
    status: StatusCode,
    body: String,
    /// (field name, file name, byte count) of each received part
    received: Arc<Mutex<Vec<(String, String, usize)>>>,
}

async fn mock_predict(State(mock): State<MockPredictor>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        mock.received.lock().unwrap().push((name, file_name, len));
    }
    (mock.status, mock.body.clone()).into_response()
}

async fn mock_health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "model_loaded": true, "using_pipeline": false}))
}

/// Start a mock predictor, returning its `/predict` URL
async fn start_mock(mock: MockPredictor) -> String {
    let app = Router::new()
        .route("/predict", post(mock_predict))
        .route("/health", get(mock_health))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/predict", addr)
}

fn mock(status: StatusCode, body: impl Into<String>) -> MockPredictor {
    MockPredictor {
        status,
        body: body.into(),
        received: Arc::new(Mutex::new(Vec::new())),
    }
}

fn upload(bytes: Vec<u8>) -> FileUpload {
    FileUpload {
        file_name: "campaigns.csv".to_string(),
        content_type: "text/csv".to_string(),
        bytes,
    }
}

fn client(url: &str) -> PredictorClient {
    PredictorClient::new(url, Duration::from_secs(5)).unwrap()
}

/// TC-PRD-001: Successful response decodes and progress reaches the total
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_predict_success() {
    // Given: a predictor returning one scored campaign
    let body = json!({
        "total_campaigns": 1,
        "predicted_successful": 1,
        "campaigns": [{
            "Platform": "Google",
            "Budget": 1200,
            "Content_Type": "Search",
            "Predicted_Success": 1,
            "Success_Probability": 87.5
        }],
        "using_pipeline": true,
        "file_type": "csv"
    });
    let mock = mock(StatusCode::OK, body.to_string());
    let received = Arc::clone(&mock.received);
    let url = start_mock(mock).await;

    // When: a 150 KiB file is sent
    let data = vec![b'x'; 150 * 1024];
    let (tx, mut rx) = mpsc::unbounded_channel();
    let response = client(&url).predict(upload(data.clone()), tx).await.unwrap();

    // Then: the campaign decodes with its prediction
    assert_eq!(response.total_campaigns, Some(1));
    assert_eq!(response.campaigns.len(), 1);
    let campaign = &response.campaigns[0];
    assert_eq!(campaign.platform, "Google");
    assert_eq!(campaign.budget, Some(1200.0));
    assert!(campaign.is_predicted_successful());
    assert_eq!(campaign.probability(), 87.5);

    // And: progress was reported per chunk and ends at the total
    let mut reports = Vec::new();
    while let Ok(p) = rx.try_recv() {
        reports.push(p);
    }
    assert!(reports.len() >= 3);
    assert!(reports.windows(2).all(|w| w[0].bytes_sent < w[1].bytes_sent));
    let last = reports.last().unwrap();
    assert_eq!(last.bytes_sent, data.len() as u64);
    assert!(last.is_done());

    // And: the file went out as the "file" field
    let parts = received.lock().unwrap().clone();
    assert_eq!(parts, vec![("file".to_string(), "campaigns.csv".to_string(), data.len())]);
}

/// TC-PRD-002: Server error surfaces the body's error field
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_predict_server_error_with_message() {
    let url = start_mock(mock(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "bad header row"}).to_string(),
    ))
    .await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = client(&url).predict(upload(b"a,b\n".to_vec()), tx).await.unwrap_err();

    assert_eq!(
        err,
        PredictorError::Server {
            status: 500,
            message: "bad header row".to_string()
        }
    );
    assert_eq!(err.to_string(), "bad header row");
}

/// TC-PRD-003: Server error without a JSON body gets a generic message
///
/// **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn test_predict_server_error_without_message() {
    let url = start_mock(mock(StatusCode::BAD_GATEWAY, "<html>upstream down</html>")).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = client(&url).predict(upload(b"a,b\n".to_vec()), tx).await.unwrap_err();

    assert_eq!(err.to_string(), "Prediction request failed (HTTP 502)");
}

/// TC-PRD-004: 200 with a non-JSON body is a malformed response
///
/// **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn test_predict_malformed_body() {
    let url = start_mock(mock(StatusCode::OK, "not json")).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = client(&url).predict(upload(b"a,b\n".to_vec()), tx).await.unwrap_err();

    assert!(matches!(err, PredictorError::MalformedResponse(_)));
}

/// TC-PRD-005: Unreachable predictor is a transport error
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_predict_connection_refused() {
    // Given: a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = client(&format!("http://{}/predict", addr))
        .predict(upload(b"a,b\n".to_vec()), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, PredictorError::Transport(_)));
    assert!(err.to_string().starts_with("Could not reach the prediction service"));
}

/// TC-PRD-006: Health endpoint is derived from the predict URL
///
/// **Type:** Integration | **Priority:** P2
#[tokio::test]
async fn test_health() {
    let url = start_mock(mock(StatusCode::OK, "{}")).await;

    let health = client(&url).health().await.unwrap();

    assert_eq!(health.status, "healthy");
    assert!(health.model_loaded);
    assert_eq!(health.using_pipeline, Some(false));
}
