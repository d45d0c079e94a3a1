//! Recommendation types

use serde::{Deserialize, Serialize};

use super::campaign::CampaignRecord;

/// One actionable recommendation shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Headline text
    pub text: String,
    /// Secondary line (confidence, audience); data-driven items only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Expected impact, 0-100
    pub impact_percent: f64,
    /// Badge label; heuristic items only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Campaign the recommendation was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_ref: Option<CampaignRecord>,
}

/// Recommendations together with where they came from
///
/// `Heuristic` is a presentation default used only while no dataset has been
/// ingested; it is never a computed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationSet {
    DataDriven { items: Vec<Recommendation> },
    Heuristic { items: Vec<Recommendation> },
}

impl RecommendationSet {
    pub fn items(&self) -> &[Recommendation] {
        match self {
            RecommendationSet::DataDriven { items } | RecommendationSet::Heuristic { items } => {
                items
            }
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, RecommendationSet::Heuristic { .. })
    }
}

/// Fixed fallback list shown before any dataset has been scored
pub fn heuristic_recommendations() -> Vec<Recommendation> {
    const FALLBACK: [(&str, f64, &str); 5] = [
        ("Increase budget on Google Ads by 15% for optimal ROI", 85.0, "High Impact"),
        ("Reduce spending on low ROI campaigns on Facebook", 72.0, "Medium Impact"),
        ("TikTok shows strong growth potential - consider scaling", 90.0, "Top Priority"),
        ("Instagram engagement is declining - review creative assets", 65.0, "Needs Attention"),
        ("Best performing time: Weekdays 10AM-11AM", 78.0, "Optimize Now"),
    ];

    FALLBACK
        .iter()
        .map(|(text, impact, label)| Recommendation {
            text: (*text).to_string(),
            detail: None,
            impact_percent: *impact,
            label: Some((*label).to_string()),
            campaign_ref: None,
        })
        .collect()
}
