//! Plain-text analysis report
//!
//! The report is a pure function of its inputs. The generation date is passed
//! in rather than read from the clock so the same summary always renders to
//! the same bytes.

use chrono::NaiveDate;

use crate::human_format::{format_amount, format_percent};
use crate::model::{CampaignRecord, DashboardSummary, Recommendation};

/// Campaigns listed in the CAMPAIGN DETAILS section
pub const REPORT_CAMPAIGN_LIMIT: usize = 20;

const TITLE: &str = "AI MARKETING ROI ANALYSIS REPORT";
const FOOTER: &str = "This report was generated by AI Marketing ROI Predictor";

/// Download file name for a report generated on `date`
pub fn report_filename(date: NaiveDate) -> String {
    format!("AI_Marketing_Report_{}.txt", date.format("%Y-%m-%d"))
}

/// Render the report.
///
/// Only the first [`REPORT_CAMPAIGN_LIMIT`] campaigns are listed, numbered
/// from 1. Missing budgets print as `N/A`.
pub fn format_report(
    summary: &DashboardSummary,
    recommendations: &[Recommendation],
    generated_on: NaiveDate,
) -> String {
    let mut lines = vec![
        TITLE.to_string(),
        "=".repeat(TITLE.len()),
        format!("Generated: {}", generated_on.format("%Y-%m-%d")),
        String::new(),
    ];

    section(&mut lines, "SUMMARY STATISTICS", 18);
    lines.extend([
        format!("Total Campaigns: {}", summary.total_campaigns),
        format!("Predicted Successful: {}", summary.predicted_successful),
        format!("Predicted Unsuccessful: {}", summary.predicted_unsuccessful),
        format!("Success Rate: {}%", format_percent(summary.success_rate_percent)),
        format!("Average Confidence: {}%", format_percent(summary.avg_confidence_percent)),
        format!("Total Budget: ${}", format_amount(summary.total_budget)),
        format!("Recommended Budget: ${}", format_amount(summary.recommended_budget)),
        String::new(),
    ]);

    section(&mut lines, "PLATFORM BREAKDOWN", 18);
    lines.extend(summary.platform_stats.iter().map(|stat| {
        format!(
            "{}: {}/{} successful ({}%), Budget: ${}",
            stat.platform,
            stat.successful_count,
            stat.total_count,
            format_percent(stat.success_rate_percent),
            format_amount(stat.budget_sum)
        )
    }));
    lines.push(String::new());

    section(&mut lines, "CAMPAIGN DETAILS", 18);
    lines.extend(
        summary
            .campaigns
            .iter()
            .take(REPORT_CAMPAIGN_LIMIT)
            .enumerate()
            .map(|(i, campaign)| format!("{}. {}", i + 1, campaign_line(campaign))),
    );
    lines.push(String::new());

    section(&mut lines, "TOP RECOMMENDATIONS", 19);
    if recommendations.is_empty() {
        lines.push("No campaigns predicted successful.".to_string());
    }
    lines.extend(recommendations.iter().enumerate().map(|(i, rec)| {
        format!(
            "{}. {} (Impact: {}%)",
            i + 1,
            rec.text,
            format_percent(rec.impact_percent)
        )
    }));
    lines.push(String::new());

    lines.push("---".to_string());
    lines.push(FOOTER.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn section(lines: &mut Vec<String>, heading: &str, rule: usize) {
    lines.push(heading.to_string());
    lines.push("-".repeat(rule));
}

fn campaign_line(campaign: &CampaignRecord) -> String {
    let budget = match campaign.budget.filter(|b| b.is_finite()) {
        Some(b) => format!("${}", format_amount(b)),
        None => "N/A".to_string(),
    };
    format!(
        "Platform: {}, Budget: {}, Recommendation: {}, Confidence: {}%",
        campaign.platform,
        budget,
        campaign.verdict().label(),
        format_percent(campaign.probability())
    )
}
