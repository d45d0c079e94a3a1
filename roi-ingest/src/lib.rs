//! roi-ingest library interface
//!
//! Exposes the application state and router so the binary and the
//! integration tests build the service the same way.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::IngestConfig;
pub use crate::error::{ApiError, ApiResult};

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use chrono::{DateTime, Utc};
use roi_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{IngestionService, Predictor};

/// Events buffered per SSE subscriber
pub const EVENT_BUS_CAPACITY: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Upload session, predictor and dashboard store
    pub ingestion: IngestionService,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub config: Arc<IngestConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: IngestConfig, predictor: Arc<dyn Predictor>, event_bus: EventBus) -> Self {
        let last_error = Arc::new(RwLock::new(None));
        let ingestion = IngestionService::new(predictor, event_bus.clone(), Arc::clone(&last_error));

        Self {
            ingestion,
            event_bus,
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::upload_routes())
        .merge(api::dashboard_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
