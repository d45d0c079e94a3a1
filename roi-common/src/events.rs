//! Upload events and the broadcast bus that carries them
//!
//! Events are serialized with a `type` tag so they can be forwarded to SSE
//! clients as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::UploadState;

/// Events published by the ingestion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoiEvent {
    /// Session moved between states
    UploadStateChanged {
        session_id: Uuid,
        attempt: u64,
        old_state: UploadState,
        new_state: UploadState,
        timestamp: DateTime<Utc>,
    },

    /// Transfer progress (0-90 while streaming, 100 on completion)
    UploadProgress {
        session_id: Uuid,
        attempt: u64,
        progress_percent: u8,
        bytes_sent: u64,
        bytes_total: u64,
        timestamp: DateTime<Utc>,
    },

    /// Predictor returned a result and the dashboard was rebuilt
    UploadCompleted {
        session_id: Uuid,
        attempt: u64,
        total_campaigns: usize,
        timestamp: DateTime<Utc>,
    },

    UploadFailed {
        session_id: Uuid,
        attempt: u64,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Selected file failed the extension check; no transfer was started
    UploadRejected {
        session_id: Uuid,
        file_name: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Session returned to Idle on request
    UploadReset {
        session_id: Uuid,
        attempt: u64,
        /// True when an in-flight request was cancelled
        cancelled_transfer: bool,
        timestamp: DateTime<Utc>,
    },
}

impl RoiEvent {
    /// Event type as string, used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            RoiEvent::UploadStateChanged { .. } => "UploadStateChanged",
            RoiEvent::UploadProgress { .. } => "UploadProgress",
            RoiEvent::UploadCompleted { .. } => "UploadCompleted",
            RoiEvent::UploadFailed { .. } => "UploadFailed",
            RoiEvent::UploadRejected { .. } => "UploadRejected",
            RoiEvent::UploadReset { .. } => "UploadReset",
        }
    }
}

/// Broadcast bus for [`RoiEvent`]s
///
/// Wraps `tokio::sync::broadcast`: publishing never blocks, and a slow
/// subscriber sees `RecvError::Lagged` instead of holding up the sender.
///
/// # Examples
///
/// ```
/// use roi_common::events::{EventBus, RoiEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(RoiEvent::UploadReset {
///     session_id: uuid::Uuid::new_v4(),
///     attempt: 1,
///     cancelled_transfer: false,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "UploadReset");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RoiEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Receive every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RoiEvent> {
        self.tx.subscribe()
    }

    /// Emit, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: RoiEvent) {
        let _ = self.tx.send(event);
    }
}
