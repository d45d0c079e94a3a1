//! Data models shared between the aggregation pipeline and the ingestion service

pub mod campaign;
pub mod recommendation;
pub mod summary;
pub mod upload;

pub use campaign::{CampaignRecord, Verdict};
pub use recommendation::{heuristic_recommendations, Recommendation, RecommendationSet};
pub use summary::{DashboardSummary, DataSource, PlatformAggregate};
pub use upload::{FileInfo, UploadState};
