//! Test Helper Utilities
//!
//! Shared utilities for testing roi-ingest: a scripted in-process predictor,
//! a mock predictor HTTP server, and multipart request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use roi_common::events::EventBus;
use roi_common::{CampaignRecord, UploadState};
use roi_ingest::services::{
    FileUpload, IngestionService, Predictor, PredictorError, PredictorHealth, PredictorResponse,
    TransferProgress,
};
use roi_ingest::{AppState, IngestConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

pub const BOUNDARY: &str = "roi-test-boundary-7d3f";

/// Scripted predictor
///
/// Reports two progress steps (half, then all of the body), optionally waits
/// on `gate`, then returns the configured outcome.
pub struct StubPredictor {
    outcome: Result<PredictorResponse, PredictorError>,
    health: Result<PredictorHealth, PredictorError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl StubPredictor {
    pub fn succeeding(campaigns: Vec<CampaignRecord>) -> Self {
        Self::with_outcome(Ok(PredictorResponse::from_campaigns(campaigns)))
    }

    pub fn failing(err: PredictorError) -> Self {
        Self::with_outcome(Err(err))
    }

    pub fn with_outcome(outcome: Result<PredictorResponse, PredictorError>) -> Self {
        Self {
            outcome,
            health: Ok(PredictorHealth {
                status: "healthy".to_string(),
                model_loaded: true,
                using_pipeline: Some(true),
            }),
            gate: None,
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.health = Err(PredictorError::Transport("connection refused".to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (file name, content type, byte count) of each call
    pub fn uploads(&self) -> Vec<(String, String, usize)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Predictor for StubPredictor {
    async fn predict(
        &self,
        upload: FileUpload,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<PredictorResponse, PredictorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let total = upload.bytes.len() as u64;
        self.uploads.lock().unwrap().push((
            upload.file_name.clone(),
            upload.content_type.clone(),
            upload.bytes.len(),
        ));

        let _ = progress.send(TransferProgress {
            bytes_sent: total / 2,
            bytes_total: total,
        });
        let _ = progress.send(TransferProgress {
            bytes_sent: total,
            bytes_total: total,
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcome.clone()
    }

    async fn health(&self) -> Result<PredictorHealth, PredictorError> {
        self.health.clone()
    }
}

/// Two Google campaigns: one Invest at 90%, one Avoid at 40%
pub fn google_pair() -> Vec<CampaignRecord> {
    vec![
        CampaignRecord::new("Google")
            .with_budget(100.0)
            .with_content_type("Search")
            .with_prediction(true, 90.0),
        CampaignRecord::new("Google").with_budget(50.0).with_prediction(false, 40.0),
    ]
}

pub fn test_service(predictor: Arc<StubPredictor>) -> (IngestionService, EventBus) {
    let event_bus = EventBus::new(100);
    let service = IngestionService::new(predictor, event_bus.clone(), Default::default());
    (service, event_bus)
}

pub fn test_app_state(predictor: Arc<StubPredictor>) -> AppState {
    AppState::new(IngestConfig::default(), predictor, EventBus::new(100))
}

/// Poll until the session reaches `state`, panicking after two seconds
pub async fn wait_for_state(service: &IngestionService, state: UploadState) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let current = service.status().await.state;
        if current == state {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("Session stuck in {:?}, expected {:?}", current, state);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Multipart body with a single file part
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub const SAMPLE_CSV: &[u8] = b"Platform,Budget,Duration,Content_Type\nGoogle,100,30,Search\nGoogle,50,14,Display\n";
