//! Upload session state machine
//!
//! One session exists per service. It moves
//! IDLE → VALIDATING → TRANSFERRING → AWAITING_RESULT → COMPLETE | FAILED
//! and back to IDLE on reset. Every accepted file selection and every reset
//! starts a new attempt; results tagged with an older attempt are refused so a
//! late response cannot overwrite a newer upload.

use chrono::{DateTime, Utc};
use roi_common::validator::{validate, FileFormat, ValidationError};
use roi_common::{FileInfo, UploadState};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Progress ceiling while the request is in flight; 100 is reserved for a
/// completed result.
pub const TRANSFER_PROGRESS_CAP: u8 = 90;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A transfer is in flight; new selections are refused
    #[error("An upload is already in progress (state {0:?})")]
    Busy(UploadState),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid upload state transition {from:?} -> {to:?}")]
    InvalidTransition { from: UploadState, to: UploadState },

    /// Event belongs to an attempt that has since been reset or replaced
    #[error("Upload attempt {attempt} has been superseded")]
    StaleAttempt { attempt: u64 },
}

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub attempt: u64,
    pub old_state: UploadState,
    pub new_state: UploadState,
    pub transitioned_at: DateTime<Utc>,
}

/// Result of an accepted file selection
#[derive(Debug, Clone)]
pub struct Selection {
    pub attempt: u64,
    pub format: FileFormat,
    /// Includes the implicit reset when the previous attempt had finished
    pub transitions: Vec<StateTransition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub session_id: Uuid,
    pub attempt: u64,
    pub state: UploadState,
    pub file: Option<FileInfo>,
    /// 0-90 while transferring, 100 when complete, 0 on failure
    pub progress_percent: u8,
    pub error_message: Option<String>,
    /// Transitions of the current attempt, oldest first
    pub transitions: Vec<StateTransition>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            attempt: 0,
            state: UploadState::Idle,
            file: None,
            progress_percent: 0,
            error_message: None,
            transitions: Vec::new(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Move to `new_state` if the edge is legal
    pub fn transition_to(&mut self, new_state: UploadState) -> Result<StateTransition, SessionError> {
        if !self.state.can_transition_to(new_state) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        let transition = StateTransition {
            session_id: self.session_id,
            attempt: self.attempt,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.transitions.push(transition.clone());

        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        Ok(transition)
    }

    /// Handle a file selection.
    ///
    /// Refused while busy. From COMPLETE or FAILED the session resets first.
    /// A name that fails the extension check sets `error_message` and leaves
    /// the session IDLE with no transition recorded.
    pub fn select_file(&mut self, file: FileInfo) -> Result<Selection, SessionError> {
        if self.state.is_busy() {
            return Err(SessionError::Busy(self.state));
        }

        let mut transitions = Vec::new();
        if self.state.is_terminal() {
            if let Some(reset) = self.reset() {
                transitions.push(reset);
            }
        }

        let format = match validate(&file.name) {
            Ok(format) => format,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return Err(SessionError::Validation(e));
            }
        };

        self.attempt += 1;
        self.file = Some(file);
        self.progress_percent = 0;
        self.error_message = None;
        self.transitions.clear();
        self.started_at = Some(Utc::now());
        self.ended_at = None;

        transitions.push(self.transition_to(UploadState::Validating)?);
        transitions.push(self.transition_to(UploadState::Transferring)?);

        Ok(Selection {
            attempt: self.attempt,
            format,
            transitions,
        })
    }

    /// Record bytes streamed so far.
    ///
    /// Maps onto 0-90%. Returns the new percentage when it increased; progress
    /// never moves backwards. Ignored once the body has been fully sent.
    pub fn record_progress(
        &mut self,
        attempt: u64,
        bytes_sent: u64,
        bytes_total: u64,
    ) -> Result<Option<u8>, SessionError> {
        self.check_attempt(attempt)?;
        if self.state != UploadState::Transferring {
            return Ok(None);
        }

        let percent = transfer_percent(bytes_sent, bytes_total);
        if percent > self.progress_percent {
            self.progress_percent = percent;
            Ok(Some(percent))
        } else {
            Ok(None)
        }
    }

    /// The whole request body has been handed to the transport
    pub fn mark_dispatched(&mut self, attempt: u64) -> Result<StateTransition, SessionError> {
        self.check_attempt(attempt)?;
        let transition = self.transition_to(UploadState::AwaitingResult)?;
        self.progress_percent = TRANSFER_PROGRESS_CAP;
        Ok(transition)
    }

    /// Predictor returned a result.
    ///
    /// If no progress callback reported the end of the body (empty file),
    /// the AWAITING_RESULT step is recorded here first.
    pub fn complete(&mut self, attempt: u64) -> Result<Vec<StateTransition>, SessionError> {
        self.check_attempt(attempt)?;

        let mut transitions = Vec::new();
        if self.state == UploadState::Transferring {
            transitions.push(self.mark_dispatched(attempt)?);
        }
        transitions.push(self.transition_to(UploadState::Complete)?);
        self.progress_percent = 100;
        self.error_message = None;

        Ok(transitions)
    }

    pub fn fail(&mut self, attempt: u64, message: impl Into<String>) -> Result<StateTransition, SessionError> {
        self.check_attempt(attempt)?;
        let transition = self.transition_to(UploadState::Failed)?;
        self.progress_percent = 0;
        self.error_message = Some(message.into());
        Ok(transition)
    }

    /// Return to IDLE with every field cleared.
    ///
    /// Always starts a new attempt so that an in-flight result is refused.
    /// Returns the recorded transition, or `None` when already IDLE.
    pub fn reset(&mut self) -> Option<StateTransition> {
        let transition = if self.state == UploadState::Idle {
            None
        } else {
            // Every non-idle state has an edge back to Idle
            self.transition_to(UploadState::Idle).ok()
        };

        self.attempt += 1;
        self.file = None;
        self.progress_percent = 0;
        self.error_message = None;
        self.transitions.clear();
        self.started_at = None;
        self.ended_at = None;

        transition
    }

    pub fn is_current(&self, attempt: u64) -> bool {
        self.attempt == attempt
    }

    fn check_attempt(&self, attempt: u64) -> Result<(), SessionError> {
        if self.is_current(attempt) {
            Ok(())
        } else {
            Err(SessionError::StaleAttempt { attempt })
        }
    }
}

/// Bytes sent → 0..=90
fn transfer_percent(bytes_sent: u64, bytes_total: u64) -> u8 {
    if bytes_total == 0 || bytes_sent >= bytes_total {
        return TRANSFER_PROGRESS_CAP;
    }
    let scaled = bytes_sent as u128 * TRANSFER_PROGRESS_CAP as u128 / bytes_total as u128;
    scaled as u8
}
