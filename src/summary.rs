//! Admin overview across every survey table.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{aggregate_records, AggregateStats};
use crate::auth::AdminCapability;
use crate::error::StoreError;
use crate::models::{
    AgeGroup, MentalHealthRecord, PhobiaRecord, PhobiaType, SeverityCategory, SurveyTable,
};
use crate::store::{fetch_mental_health, fetch_phobia_tables, QueryFilter, RecordStore};

const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhobiaCount {
    pub phobia_type: PhobiaType,
    pub count: usize,
}

/// Non-identifying view of a recent mental-health submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub wellness_score: i16,
    pub severity_category: SeverityCategory,
    pub region: String,
    pub age_group: AgeGroup,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminSummary {
    pub mental_health_responses: usize,
    pub phobia_assessments: usize,
    pub phobia_by_type: Vec<PhobiaCount>,
    /// Mental-health records categorised Severe.
    pub critical_cases: usize,
    /// Distinct non-empty regions among mental-health records.
    pub active_regions: usize,
    /// Newest first.
    pub recent_activity: Vec<RecentActivity>,
    /// Tables that failed to load and were counted as empty.
    pub failed_sources: Vec<&'static str>,
}

/// Fold one mental-health slice and the ten phobia slices into a summary.
pub fn compose_admin_summary(
    mental_health: &[MentalHealthRecord],
    phobia: &[(PhobiaType, Vec<PhobiaRecord>)],
) -> AdminSummary {
    let mental_stats = aggregate_records(mental_health);

    let phobia_by_type: Vec<PhobiaCount> = phobia
        .iter()
        .map(|(phobia_type, records)| {
            let stats: AggregateStats = aggregate_records(records);
            PhobiaCount {
                phobia_type: *phobia_type,
                count: stats.count,
            }
        })
        .collect();

    let active_regions = mental_health
        .iter()
        .map(|record| record.region.trim())
        .filter(|region| !region.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let mut recent: Vec<&MentalHealthRecord> = mental_health.iter().collect();
    recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let recent_activity = recent
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|record| RecentActivity {
            wellness_score: record.wellness_score,
            severity_category: record.severity_category,
            region: record.region.clone(),
            age_group: record.age_group,
            submitted_at: record.submitted_at,
        })
        .collect();

    AdminSummary {
        mental_health_responses: mental_stats.count,
        phobia_assessments: phobia_by_type.iter().map(|p| p.count).sum(),
        phobia_by_type,
        critical_cases: mental_stats.bucket(SeverityCategory::Severe.label()),
        active_regions,
        recent_activity,
        failed_sources: Vec::new(),
    }
}

/// Fetch all eleven tables concurrently and compose the summary.
///
/// A table that errors or times out contributes nothing and is listed in
/// `failed_sources`; the summary itself always completes.
pub async fn load_admin_summary<S>(
    store: &S,
    _admin: &AdminCapability,
    filter: QueryFilter,
    timeout: Duration,
) -> AdminSummary
where
    S: RecordStore + ?Sized,
{
    let (mental, phobia) = tokio::join!(
        fetch_mental_health(store, filter, timeout),
        fetch_phobia_tables(store, filter, timeout),
    );

    let mut failed_sources = Vec::new();
    let mental = settle(SurveyTable::MentalHealth, mental, &mut failed_sources);
    let phobia: Vec<(PhobiaType, Vec<PhobiaRecord>)> = phobia
        .into_iter()
        .map(|(phobia_type, result)| {
            let records = settle(SurveyTable::Phobia(phobia_type), result, &mut failed_sources);
            (phobia_type, records)
        })
        .collect();

    let mut summary = compose_admin_summary(&mental, &phobia);
    summary.failed_sources = failed_sources;
    info!(
        mental_health = summary.mental_health_responses,
        phobia = summary.phobia_assessments,
        failed = summary.failed_sources.len(),
        "admin summary composed"
    );
    summary
}

fn settle<T>(
    table: SurveyTable,
    result: Result<Vec<T>, StoreError>,
    failed: &mut Vec<&'static str>,
) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(_) => {
            failed.push(table.table_key());
            Vec::new()
        }
    }
}
