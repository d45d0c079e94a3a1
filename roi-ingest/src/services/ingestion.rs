//! Ingestion orchestrator
//!
//! Drives the upload session through one attempt: accept the file, stream it
//! to the predictor on a spawned task, then aggregate the scored campaigns
//! into the dashboard store. Every session mutation takes the write lock for
//! a single step and publishes the resulting events.

use chrono::Utc;
use roi_common::events::{EventBus, RoiEvent};
use roi_common::{aggregate_owned, DataSource, FileInfo, UploadState};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::models::{SessionError, StateTransition, UploadSession};
use crate::services::dashboard_store::DashboardStore;
use crate::services::predictor_client::{
    FileUpload, Predictor, PredictorError, PredictorHealth, PredictorResponse, TransferProgress,
};

/// Cancellation handle of the attempt currently in flight
struct ActiveTransfer {
    attempt: u64,
    token: CancellationToken,
}

/// Handle to a started upload
pub struct UploadTicket {
    pub attempt: u64,
    pub session: UploadSession,
    task: JoinHandle<()>,
}

impl UploadTicket {
    /// Wait for the background attempt to finish (completed, failed or cancelled)
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!(attempt = self.attempt, error = %e, "Upload task panicked");
        }
    }
}

#[derive(Clone)]
pub struct IngestionService {
    session: Arc<RwLock<UploadSession>>,
    store: DashboardStore,
    predictor: Arc<dyn Predictor>,
    event_bus: EventBus,
    active: Arc<Mutex<Option<ActiveTransfer>>>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl IngestionService {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        event_bus: EventBus,
        last_error: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(UploadSession::new())),
            store: DashboardStore::new(),
            predictor,
            event_bus,
            active: Arc::new(Mutex::new(None)),
            last_error,
        }
    }

    /// Snapshot of the upload session
    pub async fn status(&self) -> UploadSession {
        self.session.read().await.clone()
    }

    /// What the dashboard should show right now
    pub async fn data_source(&self) -> DataSource {
        self.store.current().await
    }

    pub async fn predictor_health(&self) -> Result<PredictorHealth, PredictorError> {
        self.predictor.health().await
    }

    /// Accept a file and start streaming it to the predictor.
    ///
    /// Fails with `Busy` while another attempt is in flight and with
    /// `Validation` when the extension is not allowed; neither touches the
    /// network. On success the previous summary is dropped and the transfer
    /// runs on a spawned task.
    pub async fn start_upload(&self, file: FileInfo, bytes: Vec<u8>) -> Result<UploadTicket, SessionError> {
        let mut session = self.session.write().await;

        // Leaving COMPLETE/FAILED is published even if the new file is rejected
        if session.state.is_terminal() {
            if let Some(transition) = session.reset() {
                self.publish_transitions(std::slice::from_ref(&transition));
            }
        }

        let selection = match session.select_file(file.clone()) {
            Ok(selection) => selection,
            Err(SessionError::Validation(reason)) => {
                info!(file_name = %file.name, reason = %reason, "Upload rejected");
                self.event_bus.emit_lossy(RoiEvent::UploadRejected {
                    session_id: session.session_id,
                    file_name: file.name.clone(),
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(SessionError::Validation(reason));
            }
            Err(e) => {
                debug!(file_name = %file.name, error = %e, "Upload refused");
                return Err(e);
            }
        };

        // New upload invalidates whatever the dashboard was showing
        self.store.clear().await;
        self.publish_transitions(&selection.transitions);

        let token = CancellationToken::new();
        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.replace(ActiveTransfer {
                attempt: selection.attempt,
                token: token.clone(),
            }) {
                previous.token.cancel();
            }
        }

        let content_type = if file.content_type.trim().is_empty() {
            selection.format.mime_type().to_string()
        } else {
            file.content_type.clone()
        };
        let upload = FileUpload {
            file_name: file.name.clone(),
            content_type,
            bytes,
        };

        info!(
            session_id = %session.session_id,
            attempt = selection.attempt,
            file_name = %file.name,
            size = %file.display_size(),
            "Upload started"
        );

        let snapshot = session.clone();
        drop(session);

        let service = self.clone();
        let attempt = selection.attempt;
        let task = tokio::spawn(async move {
            service.run_attempt(attempt, upload, token).await;
        });

        Ok(UploadTicket {
            attempt,
            session: snapshot,
            task,
        })
    }

    /// Return the session to IDLE, cancelling any in-flight request
    pub async fn reset(&self) -> UploadSession {
        let cancelled_transfer = match self.active.lock().await.take() {
            Some(active) => {
                active.token.cancel();
                info!(attempt = active.attempt, "Cancelled in-flight upload");
                true
            }
            None => false,
        };

        let mut session = self.session.write().await;
        if let Some(transition) = session.reset() {
            self.publish_transitions(std::slice::from_ref(&transition));
        }
        self.event_bus.emit_lossy(RoiEvent::UploadReset {
            session_id: session.session_id,
            attempt: session.attempt,
            cancelled_transfer,
            timestamp: Utc::now(),
        });

        session.clone()
    }

    async fn run_attempt(&self, attempt: u64, upload: FileUpload, token: CancellationToken) {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TransferProgress>();
        let predictor = Arc::clone(&self.predictor);
        let call = predictor.predict(upload, progress_tx);
        tokio::pin!(call);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    info!(attempt, "Upload attempt cancelled");
                    return;
                }

                Some(progress) = progress_rx.recv() => {
                    self.on_progress(attempt, progress).await;
                }

                result = &mut call => break result,
            }
        };

        // Progress reported just before the response arrived
        while let Ok(progress) = progress_rx.try_recv() {
            self.on_progress(attempt, progress).await;
        }

        match outcome {
            Ok(response) => self.on_success(attempt, response).await,
            Err(e) => self.on_failure(attempt, e).await,
        }

        self.release(attempt).await;
    }

    async fn on_progress(&self, attempt: u64, progress: TransferProgress) {
        let mut session = self.session.write().await;

        let percent = match session.record_progress(attempt, progress.bytes_sent, progress.bytes_total) {
            Ok(percent) => percent,
            Err(e) => {
                debug!(attempt, error = %e, "Progress ignored");
                return;
            }
        };

        if let Some(progress_percent) = percent {
            self.event_bus.emit_lossy(RoiEvent::UploadProgress {
                session_id: session.session_id,
                attempt,
                progress_percent,
                bytes_sent: progress.bytes_sent,
                bytes_total: progress.bytes_total,
                timestamp: Utc::now(),
            });
        }

        if progress.is_done() && session.state == UploadState::Transferring {
            match session.mark_dispatched(attempt) {
                Ok(transition) => self.publish_transitions(&[transition]),
                Err(e) => warn!(attempt, error = %e, "Could not mark request dispatched"),
            }
        }
    }

    async fn on_success(&self, attempt: u64, mut response: PredictorResponse) {
        let mut session = self.session.write().await;
        if !session.is_current(attempt) {
            info!(attempt, "Discarding result of superseded upload");
            return;
        }

        // Drop the previous summary before building the new one
        self.store.clear().await;

        let summary = aggregate_owned(std::mem::take(&mut response.campaigns));
        for mismatch in response.mismatches(&summary) {
            warn!(attempt, "Predictor summary disagrees with recomputed totals ({})", mismatch);
        }
        let total_campaigns = summary.total_campaigns;

        let transitions = match session.complete(attempt) {
            Ok(transitions) => transitions,
            Err(e) => {
                warn!(attempt, error = %e, "Could not complete upload");
                return;
            }
        };
        self.store.replace(summary).await;
        self.publish_transitions(&transitions);

        self.event_bus.emit_lossy(RoiEvent::UploadProgress {
            session_id: session.session_id,
            attempt,
            progress_percent: 100,
            bytes_sent: session.file.as_ref().map(|f| f.size).unwrap_or(0),
            bytes_total: session.file.as_ref().map(|f| f.size).unwrap_or(0),
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(RoiEvent::UploadCompleted {
            session_id: session.session_id,
            attempt,
            total_campaigns,
            timestamp: Utc::now(),
        });

        info!(attempt, total_campaigns, "Upload complete");
    }

    async fn on_failure(&self, attempt: u64, err: PredictorError) {
        let message = err.to_string();
        let mut session = self.session.write().await;

        match session.fail(attempt, message.clone()) {
            Ok(transition) => self.publish_transitions(&[transition]),
            Err(SessionError::StaleAttempt { .. }) => {
                info!(attempt, "Discarding failure of superseded upload");
                return;
            }
            Err(e) => {
                warn!(attempt, error = %e, "Could not record upload failure");
                return;
            }
        }

        self.event_bus.emit_lossy(RoiEvent::UploadFailed {
            session_id: session.session_id,
            attempt,
            error_message: message.clone(),
            timestamp: Utc::now(),
        });
        drop(session);

        error!(attempt, error = %message, "Upload failed");
        *self.last_error.write().await = Some(message);
    }

    /// Forget the cancellation token, unless a newer attempt replaced it
    async fn release(&self, attempt: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(|a| a.attempt) == Some(attempt) {
            *active = None;
        }
    }

    fn publish_transitions(&self, transitions: &[StateTransition]) {
        for t in transitions {
            debug!(
                attempt = t.attempt,
                old_state = ?t.old_state,
                new_state = ?t.new_state,
                "Upload state changed"
            );
            self.event_bus.emit_lossy(RoiEvent::UploadStateChanged {
                session_id: t.session_id,
                attempt: t.attempt,
                old_state: t.old_state,
                new_state: t.new_state,
                timestamp: t.transitioned_at,
            });
        }
    }
}
