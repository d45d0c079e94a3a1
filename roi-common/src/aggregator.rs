//! Campaign aggregation
//!
//! Turns the predictor's per-campaign records into a [`DashboardSummary`].
//! The function is total: an empty list produces the all-zero summary and
//! unscored records count as unsuccessful with zero confidence.

use std::collections::HashMap;

use tracing::debug;

use crate::human_format::round_one_decimal;
use crate::model::{CampaignRecord, DashboardSummary, PlatformAggregate};

/// Running totals for one platform while grouping
#[derive(Default)]
struct PlatformAccumulator {
    total: usize,
    successful: usize,
    budget_sum: f64,
    probability_sum: f64,
}

impl PlatformAccumulator {
    fn add(&mut self, record: &CampaignRecord) {
        self.total += 1;
        if record.is_predicted_successful() {
            self.successful += 1;
        }
        self.budget_sum += record.budget_or_zero();
        self.probability_sum += record.probability();
    }

    fn finish(self, platform: String) -> PlatformAggregate {
        PlatformAggregate {
            platform,
            total_count: self.total,
            successful_count: self.successful,
            budget_sum: self.budget_sum,
            success_rate_percent: percent_of(self.successful, self.total),
            avg_confidence_percent: mean(self.probability_sum, self.total),
        }
    }
}

fn percent_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_one_decimal(part as f64 / whole as f64 * 100.0)
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round_one_decimal(sum / count as f64)
}

/// Aggregate a borrowed record list. The input is left untouched.
pub fn aggregate(records: &[CampaignRecord]) -> DashboardSummary {
    aggregate_owned(records.to_vec())
}

/// Aggregate, taking ownership of the records so they can be stored in the
/// summary without another copy.
///
/// Platform grouping uses the exact, case-sensitive `platform` string and
/// keeps first-seen order.
pub fn aggregate_owned(records: Vec<CampaignRecord>) -> DashboardSummary {
    if records.is_empty() {
        return DashboardSummary::empty();
    }

    let mut order: Vec<(String, PlatformAccumulator)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    let mut successful = 0usize;
    let mut total_budget = 0.0;
    let mut recommended_budget = 0.0;
    let mut probability_sum = 0.0;

    for record in &records {
        let slot = match index.get(record.platform.as_str()) {
            Some(&slot) => slot,
            None => {
                order.push((record.platform.clone(), PlatformAccumulator::default()));
                index.insert(record.platform.as_str(), order.len() - 1);
                order.len() - 1
            }
        };
        order[slot].1.add(record);

        let budget = record.budget_or_zero();
        total_budget += budget;
        probability_sum += record.probability();
        if record.is_predicted_successful() {
            successful += 1;
            recommended_budget += budget;
        }
    }

    let total = records.len();
    let platform_stats: Vec<PlatformAggregate> = order
        .into_iter()
        .map(|(platform, acc)| acc.finish(platform))
        .collect();

    debug!(
        total_campaigns = total,
        predicted_successful = successful,
        platforms = platform_stats.len(),
        "Aggregated campaign records"
    );

    DashboardSummary {
        total_campaigns: total,
        predicted_successful: successful,
        predicted_unsuccessful: total - successful,
        success_rate_percent: percent_of(successful, total),
        avg_confidence_percent: mean(probability_sum, total),
        total_budget,
        recommended_budget,
        platform_stats,
        campaigns: records,
    }
}
