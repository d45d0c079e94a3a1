//! HTTP API handlers for roi-ingest
//!
//! JSON endpoints consumed by the dashboard front end, plus the SSE stream.

pub mod dashboard;
pub mod health;
pub mod sse;
pub mod upload;

pub use dashboard::dashboard_routes;
pub use health::health_routes;
pub use sse::{event_stream, HEARTBEAT_INTERVAL};
pub use upload::upload_routes;
