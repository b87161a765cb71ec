//! Public dashboards for each survey family.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{aggregate_records, AggregateStats, WellnessTrend};
use crate::models::{MentalHealthRecord, PhobiaRecord, PhobiaType};
use crate::store::{fetch_mental_health, fetch_phobia_tables, QueryFilter, RecordStore, TimeWindow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentalHealthDashboard {
    #[serde(skip)]
    pub window: TimeWindow,
    pub stats: AggregateStats,
    pub average_score: i64,
    pub trend: WellnessTrend,
    /// Set when the query failed and the dashboard fell back to empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MentalHealthDashboard {
    pub fn from_records(window: TimeWindow, records: &[MentalHealthRecord]) -> Self {
        let stats = aggregate_records(records);
        let trend = if stats.count == 0 {
            WellnessTrend::Stable
        } else {
            WellnessTrend::from_average(stats.average_score)
        };
        Self {
            window,
            average_score: stats.rounded_average(),
            trend,
            stats,
            error: None,
        }
    }
}

pub async fn load_mental_health_dashboard<S>(
    store: &S,
    window: TimeWindow,
    now: DateTime<Utc>,
    timeout: Duration,
) -> MentalHealthDashboard
where
    S: RecordStore + ?Sized,
{
    let filter = QueryFilter::for_window(window, now);
    match fetch_mental_health(store, filter, timeout).await {
        Ok(records) => MentalHealthDashboard::from_records(window, &records),
        Err(err) => {
            let mut dashboard = MentalHealthDashboard::from_records(window, &[]);
            dashboard.error = Some(err.to_string());
            dashboard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhobiaOverviewEntry {
    pub phobia_type: PhobiaType,
    pub stats: AggregateStats,
}

impl PhobiaOverviewEntry {
    pub fn total_assessments(&self) -> usize {
        self.stats.count
    }

    pub fn average_intensity(&self) -> i64 {
        self.stats.rounded_average()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhobiaDashboard {
    #[serde(skip)]
    pub window: TimeWindow,
    /// Types with at least one assessment, most assessed first.
    pub overview: Vec<PhobiaOverviewEntry>,
    /// Type shown in the regional drill-down.
    pub selected: Option<PhobiaType>,
    pub failed: Vec<PhobiaType>,
}

impl PhobiaDashboard {
    /// `preferred` wins when it has data; otherwise the most assessed type is selected.
    pub fn from_tables(
        window: TimeWindow,
        tables: &[(PhobiaType, Vec<PhobiaRecord>)],
        preferred: Option<PhobiaType>,
    ) -> Self {
        let overview = phobia_overview(tables);
        let selected = preferred
            .filter(|wanted| overview.iter().any(|e| e.phobia_type == *wanted))
            .or_else(|| overview.first().map(|e| e.phobia_type));
        Self {
            window,
            overview,
            selected,
            failed: Vec::new(),
        }
    }

    pub fn selected_entry(&self) -> Option<&PhobiaOverviewEntry> {
        let selected = self.selected?;
        self.overview.iter().find(|e| e.phobia_type == selected)
    }
}

/// One aggregate per phobia type with data, sorted by assessment count
/// descending. Equal counts keep catalog order.
pub fn phobia_overview(tables: &[(PhobiaType, Vec<PhobiaRecord>)]) -> Vec<PhobiaOverviewEntry> {
    let mut overview: Vec<PhobiaOverviewEntry> = tables
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(phobia_type, records)| PhobiaOverviewEntry {
            phobia_type: *phobia_type,
            stats: aggregate_records(records),
        })
        .collect();
    overview.sort_by(|a, b| b.stats.count.cmp(&a.stats.count));
    overview
}

pub async fn load_phobia_dashboard<S>(
    store: &S,
    window: TimeWindow,
    now: DateTime<Utc>,
    preferred: Option<PhobiaType>,
    timeout: Duration,
) -> PhobiaDashboard
where
    S: RecordStore + ?Sized,
{
    let filter = QueryFilter::for_window(window, now);
    let mut failed = Vec::new();
    let tables: Vec<(PhobiaType, Vec<PhobiaRecord>)> = fetch_phobia_tables(store, filter, timeout)
        .await
        .into_iter()
        .map(|(phobia_type, result)| match result {
            Ok(records) => (phobia_type, records),
            Err(_) => {
                failed.push(phobia_type);
                (phobia_type, Vec::new())
            }
        })
        .collect();

    let mut dashboard = PhobiaDashboard::from_tables(window, &tables, preferred);
    dashboard.failed = failed;
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeGroup, RiskLevel, SeverityCategory};
    use uuid::Uuid;

    fn phobia(intensity: i16, risk: RiskLevel, region: &str) -> PhobiaRecord {
        PhobiaRecord {
            id: Uuid::new_v4(),
            frequency_of_fear: 3,
            avoidance_level: 3,
            physical_symptoms_intensity: 3,
            interference_with_life: 3,
            duration_months: 2,
            intensity_percentage: intensity,
            risk_level: risk,
            region: region.to_string(),
            age_group: AgeGroup::From35To44,
            submitted_at: Utc::now(),
        }
    }

    fn mental(score: i16, category: SeverityCategory) -> MentalHealthRecord {
        MentalHealthRecord {
            id: Uuid::new_v4(),
            stress_level: 3,
            anxiety_level: 3,
            mood_level: 3,
            sleep_quality: 3,
            focus_ability: 3,
            emotional_regulation: 3,
            social_connection: 3,
            physical_energy: 3,
            motivation_level: 3,
            appetite_changes: 3,
            intrusive_thoughts: 3,
            hopelessness_feeling: 3,
            wellness_score: score,
            severity_category: category,
            region: "Central".to_string(),
            age_group: AgeGroup::From55To64,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn mental_health_dashboard_rounds_and_trends() {
        let records = vec![
            mental(80, SeverityCategory::Stable),
            mental(60, SeverityCategory::Mild),
            mental(20, SeverityCategory::Severe),
        ];
        let dashboard = MentalHealthDashboard::from_records(TimeWindow::AllTime, &records);
        assert_eq!(dashboard.average_score, 53);
        assert_eq!(dashboard.trend, WellnessTrend::Stable);
        assert_eq!(dashboard.stats.bucket("Moderate"), 0);
    }

    #[test]
    fn empty_mental_dashboard_is_zeroed() {
        let dashboard = MentalHealthDashboard::from_records(TimeWindow::Week, &[]);
        assert_eq!(dashboard.stats.count, 0);
        assert_eq!(dashboard.average_score, 0);
        assert_eq!(dashboard.trend, WellnessTrend::Stable);
    }

    #[test]
    fn overview_skips_empty_types_and_sorts_by_volume() {
        let tables = vec![
            (PhobiaType::Acrophobia, vec![phobia(30, RiskLevel::Medium, "A")]),
            (PhobiaType::Agoraphobia, Vec::new()),
            (
                PhobiaType::Hemophobia,
                vec![
                    phobia(90, RiskLevel::Severe, "A"),
                    phobia(70, RiskLevel::High, "B"),
                ],
            ),
            (PhobiaType::Cynophobia, vec![phobia(10, RiskLevel::Low, "C")]),
        ];
        let overview = phobia_overview(&tables);
        let order: Vec<_> = overview.iter().map(|e| e.phobia_type).collect();
        assert_eq!(
            order,
            vec![
                PhobiaType::Hemophobia,
                PhobiaType::Acrophobia,
                PhobiaType::Cynophobia
            ]
        );
        assert_eq!(overview[0].total_assessments(), 2);
        assert_eq!(overview[0].average_intensity(), 80);
        assert_eq!(overview[0].stats.bucket("severe"), 1);
    }

    #[test]
    fn selection_prefers_requested_type_with_data() {
        let tables = vec![
            (PhobiaType::Acrophobia, vec![phobia(30, RiskLevel::Medium, "A")]),
            (
                PhobiaType::Hemophobia,
                vec![
                    phobia(90, RiskLevel::Severe, "A"),
                    phobia(70, RiskLevel::High, "B"),
                ],
            ),
        ];
        let default_pick = PhobiaDashboard::from_tables(TimeWindow::AllTime, &tables, None);
        assert_eq!(default_pick.selected, Some(PhobiaType::Hemophobia));

        let chosen =
            PhobiaDashboard::from_tables(TimeWindow::AllTime, &tables, Some(PhobiaType::Acrophobia));
        assert_eq!(chosen.selected, Some(PhobiaType::Acrophobia));
        let entry = chosen.selected_entry().expect("selected entry");
        assert_eq!(entry.stats.regional_breakdown[0].region, "A");

        let missing =
            PhobiaDashboard::from_tables(TimeWindow::AllTime, &tables, Some(PhobiaType::Aquaphobia));
        assert_eq!(missing.selected, Some(PhobiaType::Hemophobia));
    }
}
