//! Dashboard summary types produced by the aggregator

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::campaign::CampaignRecord;

/// Per-platform rollup, one per distinct `platform` value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAggregate {
    pub platform: String,
    pub total_count: usize,
    pub successful_count: usize,
    pub budget_sum: f64,
    /// successful_count / total_count * 100, one decimal
    pub success_rate_percent: f64,
    /// Mean success probability within the platform, one decimal
    pub avg_confidence_percent: f64,
}

/// Summary of one completed ingestion
///
/// Immutable once built. The next ingestion replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_campaigns: usize,
    pub predicted_successful: usize,
    pub predicted_unsuccessful: usize,
    pub success_rate_percent: f64,
    pub avg_confidence_percent: f64,
    pub total_budget: f64,
    /// Budget sum over campaigns predicted successful
    pub recommended_budget: f64,
    /// First-seen platform order
    pub platform_stats: Vec<PlatformAggregate>,
    /// Input order preserved
    pub campaigns: Vec<CampaignRecord>,
}

impl DashboardSummary {
    pub fn empty() -> Self {
        Self {
            total_campaigns: 0,
            predicted_successful: 0,
            predicted_unsuccessful: 0,
            success_rate_percent: 0.0,
            avg_confidence_percent: 0.0,
            total_budget: 0.0,
            recommended_budget: 0.0,
            platform_stats: Vec::new(),
            campaigns: Vec::new(),
        }
    }
}

/// What the dashboard is showing: a scored dataset, or nothing ingested yet
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DataSource {
    Scored { summary: Arc<DashboardSummary> },
    #[default]
    Unscored,
}

impl DataSource {
    pub fn scored(summary: DashboardSummary) -> Self {
        DataSource::Scored {
            summary: Arc::new(summary),
        }
    }

    pub fn summary(&self) -> Option<&Arc<DashboardSummary>> {
        match self {
            DataSource::Scored { summary } => Some(summary),
            DataSource::Unscored => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, DataSource::Scored { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_serializes_with_mode_tag() {
        let unscored = serde_json::to_value(DataSource::Unscored).unwrap();
        assert_eq!(unscored, serde_json::json!({"mode": "unscored"}));

        let scored = serde_json::to_value(DataSource::scored(DashboardSummary::empty())).unwrap();
        assert_eq!(scored["mode"], "scored");
        assert_eq!(scored["summary"]["total_campaigns"], 0);
    }
}
