//! Ranked recommendations
//!
//! Data-driven recommendations are the campaigns predicted successful,
//! highest probability first. The heuristic list is only substituted when no
//! dataset has been ingested; an ingested dataset with zero successful
//! campaigns yields an empty data-driven set.

use crate::human_format::{format_amount_grouped, format_percent, round_one_decimal};
use crate::model::{heuristic_recommendations, CampaignRecord, DataSource, Recommendation, RecommendationSet};

/// Number of recommendations returned when the caller does not ask otherwise
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// Top `n` successful campaigns, descending by success probability.
///
/// The sort is stable, so campaigns with equal probability keep their input
/// order. The result is never padded.
pub fn recommend(records: &[CampaignRecord], n: usize) -> Vec<Recommendation> {
    let mut successful: Vec<&CampaignRecord> = records
        .iter()
        .filter(|r| r.is_predicted_successful())
        .collect();

    successful.sort_by(|a, b| b.probability().total_cmp(&a.probability()));

    successful
        .into_iter()
        .take(n)
        .map(recommendation_from)
        .collect()
}

/// Recommendations for whatever the dashboard currently shows
pub fn recommendations_for(source: &DataSource, n: usize) -> RecommendationSet {
    match source.summary() {
        Some(summary) => RecommendationSet::DataDriven {
            items: recommend(&summary.campaigns, n),
        },
        None => RecommendationSet::Heuristic {
            items: heuristic_recommendations(),
        },
    }
}

fn recommendation_from(record: &CampaignRecord) -> Recommendation {
    Recommendation {
        text: headline(record),
        detail: Some(detail(record)),
        impact_percent: round_one_decimal(record.probability()),
        label: None,
        campaign_ref: Some(record.clone()),
    }
}

/// "Instagram - Video | Budget: $25,000"
fn headline(record: &CampaignRecord) -> String {
    let content_type = record.content_type.as_deref().unwrap_or("Unknown");
    let mut text = format!("{} - {}", record.platform, content_type);
    if let Some(budget) = record.budget.filter(|b| b.is_finite()) {
        text.push_str(&format!(" | Budget: ${}", format_amount_grouped(budget)));
    }
    text
}

/// "Confidence: 87.3% | Age: 25-34 | Region: US"
fn detail(record: &CampaignRecord) -> String {
    let mut parts = vec![format!("Confidence: {}%", format_percent(record.probability()))];
    if let Some(age) = &record.target_age {
        parts.push(format!("Age: {}", age));
    }
    if let Some(region) = &record.region {
        parts.push(format!("Region: {}", region));
    }
    parts.join(" | ")
}
