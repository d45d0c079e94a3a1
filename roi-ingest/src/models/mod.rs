//! Data models for roi-ingest
//!
//! - Upload session state machine

pub mod upload_session;

pub use upload_session::{
    Selection, SessionError, StateTransition, UploadSession, TRANSFER_PROGRESS_CAP,
};
