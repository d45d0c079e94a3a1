//! Prediction service client
//!
//! Sends one multipart request (field `file`) to the predictor and decodes the
//! scored campaigns. The body is streamed in chunks so that transfer progress
//! can be reported byte by byte. There is no retry: one attempt, and any
//! failure is surfaced to the caller.

use async_trait::async_trait;
use reqwest::{multipart, StatusCode, Url};
use roi_common::{CampaignRecord, DashboardSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const USER_AGENT: &str = concat!("roi-ingest/", env!("CARGO_PKG_VERSION"));
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    /// Request not sent or no response received
    #[error("Could not reach the prediction service: {0}")]
    Transport(String),

    /// Non-success status; `message` is the server's `error` field when present
    #[error("{message}")]
    Server { status: u16, message: String },

    /// 2xx response whose body is not the expected JSON
    #[error("Malformed response from the prediction service: {0}")]
    MalformedResponse(String),

    #[error("Invalid predictor URL '{0}'")]
    InvalidUrl(String),
}

/// File handed to the predictor
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Bytes of the request body handed to the transport so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl TransferProgress {
    pub fn is_done(&self) -> bool {
        self.bytes_sent >= self.bytes_total
    }
}

/// Successful `/predict` body.
///
/// Only `campaigns` is required. The summary fields are the predictor's own
/// figures and are used for cross-checking; the dashboard recomputes them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictorResponse {
    #[serde(default)]
    pub total_campaigns: Option<usize>,
    #[serde(default)]
    pub predicted_successful: Option<usize>,
    #[serde(default)]
    pub predicted_unsuccessful: Option<usize>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub avg_confidence: Option<f64>,
    #[serde(default)]
    pub total_budget: Option<f64>,
    #[serde(default)]
    pub recommended_budget: Option<f64>,
    #[serde(default)]
    pub platform_stats: Vec<Value>,
    pub campaigns: Vec<CampaignRecord>,
    #[serde(default)]
    pub using_pipeline: Option<bool>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl PredictorResponse {
    pub fn from_campaigns(campaigns: Vec<CampaignRecord>) -> Self {
        Self {
            campaigns,
            ..Self::default()
        }
    }

    /// Predictor-reported totals that disagree with a recomputed summary
    pub fn mismatches(&self, summary: &DashboardSummary) -> Vec<String> {
        let mut mismatches = Vec::new();

        let counts = [
            ("total_campaigns", self.total_campaigns, summary.total_campaigns),
            ("predicted_successful", self.predicted_successful, summary.predicted_successful),
            ("predicted_unsuccessful", self.predicted_unsuccessful, summary.predicted_unsuccessful),
        ];
        for (field, reported, computed) in counts {
            if let Some(reported) = reported {
                if reported != computed {
                    mismatches.push(format!("{}: reported {}, computed {}", field, reported, computed));
                }
            }
        }

        // Predictor rounds rates to two decimals
        if let Some(rate) = self.success_rate {
            if (rate - summary.success_rate_percent).abs() > 0.1 {
                mismatches.push(format!(
                    "success_rate: reported {}, computed {}",
                    rate, summary.success_rate_percent
                ));
            }
        }

        mismatches
    }
}

/// `/health` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_pipeline: Option<bool>,
}

/// Seam between the ingestion service and the remote predictor
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Score one file. Progress is reported on `progress` as the body streams.
    async fn predict(
        &self,
        upload: FileUpload,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<PredictorResponse, PredictorError>;

    async fn health(&self) -> Result<PredictorHealth, PredictorError>;
}

/// Message for a non-success response: the body's `error` string if there is
/// one, otherwise a generic line naming the status.
pub fn server_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| format!("Prediction request failed (HTTP {})", status.as_u16()))
}

/// HTTP implementation of [`Predictor`]
pub struct PredictorClient {
    http_client: reqwest::Client,
    predict_url: Url,
    health_url: Url,
}

impl PredictorClient {
    /// `predict_url` is the full upload endpoint; the health endpoint is its
    /// sibling `health` path.
    pub fn new(predict_url: &str, timeout: Duration) -> Result<Self, PredictorError> {
        let predict_url =
            Url::parse(predict_url).map_err(|_| PredictorError::InvalidUrl(predict_url.to_string()))?;
        let health_url = health_url_for(&predict_url)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PredictorError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            predict_url,
            health_url,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

fn health_url_for(predict_url: &Url) -> Result<Url, PredictorError> {
    let mut url = predict_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| PredictorError::InvalidUrl(predict_url.to_string()))?
        .pop_if_empty()
        .pop()
        .push("health");
    Ok(url)
}

/// Request body that reports each chunk as it is pulled by the transport
fn progress_body(
    bytes: Vec<u8>,
    progress: mpsc::UnboundedSender<TransferProgress>,
) -> (reqwest::Body, u64) {
    let bytes_total = bytes.len() as u64;
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

    let mut bytes_sent = 0u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        bytes_sent += chunk.len() as u64;
        // Receiver gone means the attempt was abandoned; keep sending the body
        let _ = progress.send(TransferProgress {
            bytes_sent,
            bytes_total,
        });
        Ok::<_, std::io::Error>(chunk)
    }));

    (reqwest::Body::wrap_stream(stream), bytes_total)
}

#[async_trait]
impl Predictor for PredictorClient {
    async fn predict(
        &self,
        upload: FileUpload,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<PredictorResponse, PredictorError> {
        let (body, length) = progress_body(upload.bytes, progress);

        let part = multipart::Part::stream_with_length(body, length)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| PredictorError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(
            url = %self.predict_url,
            file_name = %upload.file_name,
            bytes = length,
            "Sending prediction request"
        );

        let response = self
            .http_client
            .post(self.predict_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| PredictorError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PredictorError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = server_error_message(status, &body);
            tracing::warn!(status = status.as_u16(), message = %message, "Prediction request failed");
            return Err(PredictorError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| PredictorError::MalformedResponse(e.to_string()))
    }

    async fn health(&self) -> Result<PredictorHealth, PredictorError> {
        let response = self
            .http_client
            .get(self.health_url.clone())
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| PredictorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(PredictorError::Server {
                status: status.as_u16(),
                message: server_error_message(status, &body),
            });
        }

        response
            .json::<PredictorHealth>()
            .await
            .map_err(|e| PredictorError::MalformedResponse(e.to_string()))
    }
}
