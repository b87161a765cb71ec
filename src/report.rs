use std::fmt::Write;

use crate::aggregate::AggregateStats;
use crate::collector::SubmissionReceipt;
use crate::dashboard::{MentalHealthDashboard, PhobiaDashboard};
use crate::summary::AdminSummary;

pub fn render_receipt(receipt: &SubmissionReceipt) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Assessment Complete");
    if let Some(phobia) = receipt.phobia_type {
        let _ = writeln!(output, "{}", phobia.descriptor().medical_term);
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Phobia intensity: {}% ({} risk level)",
            receipt.score, receipt.label
        );
    } else {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Mental wellness score: {} ({})",
            receipt.score, receipt.label
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Guidance");
    for line in receipt.guidance {
        let _ = writeln!(output, "- {}", line);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "_{}_", receipt.disclaimer);

    output
}

fn write_buckets(output: &mut String, stats: &AggregateStats) {
    if stats.bucket_counts.is_empty() {
        let _ = writeln!(output, "No responses recorded for this window.");
        return;
    }
    for bucket in &stats.bucket_counts {
        let _ = writeln!(
            output,
            "- {}: {} ({}%)",
            bucket.label,
            bucket.count,
            stats.bucket_percentage(bucket.label)
        );
    }
    if stats.unrecognized > 0 {
        let _ = writeln!(output, "- Uncategorised: {}", stats.unrecognized);
    }
}

fn write_regions(output: &mut String, stats: &AggregateStats, unit: &str) {
    if stats.regional_breakdown.is_empty() {
        let _ = writeln!(output, "No regional data available.");
        return;
    }
    for region in &stats.regional_breakdown {
        let _ = writeln!(
            output,
            "- {}: {}{} across {} responses",
            region.region,
            region.average_score.round(),
            unit,
            region.count
        );
    }
}

pub fn render_mental_health_dashboard(dashboard: &MentalHealthDashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Mental Wellness Dashboard");
    let _ = writeln!(output, "Responses from {}", dashboard.window);
    if let Some(error) = &dashboard.error {
        let _ = writeln!(output);
        let _ = writeln!(output, "> Data could not be loaded: {}", error);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "- Total responses: {}", dashboard.stats.count);
    let _ = writeln!(output, "- Average wellness score: {}", dashboard.average_score);
    let _ = writeln!(output, "- Trend: {}", dashboard.trend.label());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Severity Distribution");
    write_buckets(&mut output, &dashboard.stats);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Regional Wellness");
    write_regions(&mut output, &dashboard.stats, "");

    output
}

pub fn render_phobia_dashboard(dashboard: &PhobiaDashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Phobia Dashboard");
    let _ = writeln!(output, "Assessments from {}", dashboard.window);
    if !dashboard.failed.is_empty() {
        let names: Vec<_> = dashboard.failed.iter().map(|p| p.id()).collect();
        let _ = writeln!(output);
        let _ = writeln!(output, "> Could not load: {}", names.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Phobia Overview");
    if dashboard.overview.is_empty() {
        let _ = writeln!(output, "No assessments recorded for this window.");
    } else {
        for entry in &dashboard.overview {
            let descriptor = entry.phobia_type.descriptor();
            let _ = writeln!(
                output,
                "- {} ({}): {} assessments, avg intensity {}%",
                descriptor.medical_term,
                descriptor.display_name,
                entry.total_assessments(),
                entry.average_intensity()
            );
        }
    }

    if let Some(entry) = dashboard.selected_entry() {
        let descriptor = entry.phobia_type.descriptor();
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", descriptor.medical_term);
        let _ = writeln!(output, "{}", descriptor.description);
        let _ = writeln!(output);
        let _ = writeln!(output, "### Risk Levels");
        write_buckets(&mut output, &entry.stats);
        let _ = writeln!(output);
        let _ = writeln!(output, "### Regional Intensity");
        write_regions(&mut output, &entry.stats, "%");
    }

    output
}

pub fn render_admin_summary(summary: &AdminSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Admin Summary");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- Mental health responses: {}",
        summary.mental_health_responses
    );
    let _ = writeln!(output, "- Phobia assessments: {}", summary.phobia_assessments);
    let _ = writeln!(output, "- Critical alerts: {}", summary.critical_cases);
    let _ = writeln!(output, "- Active regions: {}", summary.active_regions);

    if !summary.failed_sources.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "> Counted as empty after failing to load: {}",
            summary.failed_sources.join(", ")
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Phobia Assessments by Type");
    for entry in &summary.phobia_by_type {
        let _ = writeln!(
            output,
            "- {}: {}",
            entry.phobia_type.descriptor().medical_term,
            entry.count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");
    if summary.recent_activity.is_empty() {
        let _ = writeln!(output, "No submissions yet.");
    } else {
        for activity in &summary.recent_activity {
            let region = if activity.region.trim().is_empty() {
                "Unknown"
            } else {
                activity.region.as_str()
            };
            let _ = writeln!(
                output,
                "- {} score {} ({}) from {}, age {}",
                activity.submitted_at.format("%Y-%m-%d %H:%M"),
                activity.wellness_score,
                activity.severity_category,
                region,
                activity.age_group
            );
        }
    }

    output
}
