//! # ROI Common Library
//!
//! Shared code for the marketing ROI services:
//! - Campaign, summary and recommendation models
//! - File validation (extension allowlist)
//! - Aggregation of scored campaigns into dashboard summaries
//! - Recommendation ranking
//! - Plain-text report formatting
//! - Configuration loading and the upload event bus

pub mod aggregator;
pub mod config;
pub mod error;
pub mod events;
pub mod human_format;
pub mod model;
pub mod recommender;
pub mod report;
pub mod validator;

pub use aggregator::{aggregate, aggregate_owned};
pub use error::{Error, Result};
pub use model::{
    CampaignRecord, DashboardSummary, DataSource, FileInfo, PlatformAggregate, Recommendation,
    RecommendationSet, UploadState,
};
pub use recommender::{recommend, recommendations_for, DEFAULT_RECOMMENDATION_COUNT};
pub use report::{format_report, report_filename, REPORT_CAMPAIGN_LIMIT};
pub use validator::{validate, FileFormat, ValidationError};
