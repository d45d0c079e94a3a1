//! Upload lifecycle states and file descriptors

use serde::{Deserialize, Serialize};

/// Upload lifecycle state
///
/// Idle → Validating → Transferring → AwaitingResult → Complete | Failed,
/// with reset returning any non-idle state to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadState {
    /// No file selected
    Idle,
    /// Checking the file name against the extension allowlist
    Validating,
    /// Request body is being streamed to the predictor
    Transferring,
    /// Body sent, waiting for the predictor's response
    AwaitingResult,
    /// Predictor returned a result
    Complete,
    /// Predictor or transport reported an error
    Failed,
}

impl UploadState {
    /// States in which a new file selection must be refused
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            UploadState::Validating | UploadState::Transferring | UploadState::AwaitingResult
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Complete | UploadState::Failed)
    }

    /// Legal edges of the state machine
    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Transferring)
                | (Validating, Idle)
                | (Transferring, AwaitingResult)
                | (Transferring, Failed)
                | (Transferring, Idle)
                | (AwaitingResult, Complete)
                | (AwaitingResult, Failed)
                | (AwaitingResult, Idle)
                | (Complete, Idle)
                | (Failed, Idle)
        )
    }
}

/// Descriptor of the selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type as reported by the client
    #[serde(rename = "type")]
    pub content_type: String,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: content_type.into(),
        }
    }

    /// Size rendered for display ("1.5 KB")
    pub fn display_size(&self) -> String {
        crate::human_format::format_file_size(self.size)
    }
}
