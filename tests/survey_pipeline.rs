use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use community_pulse::aggregate::{aggregate_records, WellnessTrend};
use community_pulse::auth::{AdminCapability, TokenIdentity};
use community_pulse::collector::{CollectorState, ResponseCollector};
use community_pulse::dashboard::{load_mental_health_dashboard, load_phobia_dashboard};
use community_pulse::error::{ExportError, StoreError, SubmitError};
use community_pulse::export::{export_table, ExportFormat, ExportRequest};
use community_pulse::models::{
    AgeGroup, MentalHealthRecord, NewRecord, PhobiaType, SeverityCategory, SurveyRecord,
    SurveyTable,
};
use community_pulse::store::{MemoryStore, QueryFilter, RecordStore, TimeWindow};
use community_pulse::summary::load_admin_summary;

const TIMEOUT: Duration = Duration::from_millis(100);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

fn admin() -> AdminCapability {
    let identity = TokenIdentity::new(Some("pulse-admin".into()), Some("pulse-admin".into()));
    AdminCapability::issue(&identity).expect("admin capability")
}

fn mental_health(answers: &[u8], region: &str, age_group: AgeGroup) -> ResponseCollector {
    let mut collector = ResponseCollector::mental_health();
    for value in answers {
        collector.answer(*value).expect("answer");
    }
    collector.set_region(region).expect("region");
    collector.set_age_group(age_group).expect("age group");
    collector
}

fn phobia(phobia_type: PhobiaType, answers: &[u8], region: &str) -> ResponseCollector {
    let mut collector = ResponseCollector::phobia();
    collector.select_phobia(phobia_type).expect("select");
    for value in answers {
        collector.answer(*value).expect("answer");
    }
    collector.set_region(region).expect("region");
    collector.set_age_group(AgeGroup::From35To44).expect("age group");
    collector.set_duration_months(8).expect("duration");
    collector
}

fn stage(store: &MemoryStore, collector: &ResponseCollector, submitted_at: DateTime<Utc>) {
    let (record, _) = collector.finalize().expect("finalize");
    store.insert_at(record, submitted_at).expect("insert");
}

/// Serves the in-memory data but fails or stalls on chosen tables.
struct UnreliableStore {
    inner: MemoryStore,
    failing: Vec<SurveyTable>,
    stalled: Vec<SurveyTable>,
}

#[async_trait]
impl RecordStore for UnreliableStore {
    async fn insert(&self, record: NewRecord) -> Result<SurveyRecord, StoreError> {
        self.inner.insert(record).await
    }

    async fn query(
        &self,
        table: SurveyTable,
        filter: QueryFilter,
    ) -> Result<Vec<SurveyRecord>, StoreError> {
        if self.failing.contains(&table) {
            return Err(StoreError::Unavailable(format!("{table} offline")));
        }
        if self.stalled.contains(&table) {
            std::future::pending::<()>().await;
        }
        self.inner.query(table, filter).await
    }
}

#[tokio::test]
async fn neutral_mental_health_submission_scores_mild() {
    let store = MemoryStore::new();
    let mut collector = mental_health(&[3; 12], "Riverside", AgeGroup::From25To34);

    let (record, receipt) = collector.submit(&store).await.expect("submit");
    assert_eq!(receipt.score, 60);
    assert_eq!(receipt.label, "Mild");
    assert_eq!(collector.state(), CollectorState::Submitted);

    let record = record.into_mental_health().expect("mental health record");
    assert_eq!(record.wellness_score, 60);
    assert_eq!(record.severity_category, SeverityCategory::Mild);
    assert_eq!(record.region, "Riverside");
    assert_eq!(store.len(SurveyTable::MentalHealth), 1);
}

#[tokio::test]
async fn maximal_phobia_submission_is_severe_and_lands_in_its_table() {
    let store = MemoryStore::new();
    let mut collector = phobia(PhobiaType::Claustrophobia, &[5, 5, 5, 5], "Harbor");

    let (_, receipt) = collector.submit(&store).await.expect("submit");
    assert_eq!(receipt.score, 100);
    assert_eq!(receipt.label, "Severe");
    assert_eq!(store.len(SurveyTable::Phobia(PhobiaType::Claustrophobia)), 1);
    assert_eq!(store.len(SurveyTable::Phobia(PhobiaType::Acrophobia)), 0);
    assert_eq!(store.len(SurveyTable::MentalHealth), 0);
}

#[tokio::test]
async fn submission_before_demographics_writes_nothing() {
    let store = MemoryStore::new();
    let mut incomplete = ResponseCollector::mental_health();
    incomplete.answer(2).expect("answer");

    let err = incomplete.submit(&store).await.expect_err("not at demographics");
    assert!(matches!(err, SubmitError::Validation(_)));
    assert_eq!(incomplete.state(), CollectorState::Question(1));
    assert_eq!(store.len(SurveyTable::MentalHealth), 0);
}

#[tokio::test]
async fn aggregates_mixed_severity_records() {
    let store = MemoryStore::new();
    // 80, 60 and 20
    stage(&store, &mental_health(&[5, 5, 5, 4, 4, 4, 3, 3, 3, 4, 4, 4], "A", AgeGroup::From18To24), now());
    stage(&store, &mental_health(&[3; 12], "B", AgeGroup::From18To24), now());
    stage(&store, &mental_health(&[1; 12], "C", AgeGroup::From18To24), now());

    let records: Vec<MentalHealthRecord> = store
        .query(SurveyTable::MentalHealth, QueryFilter::all())
        .await
        .expect("query")
        .into_iter()
        .filter_map(SurveyRecord::into_mental_health)
        .collect();
    let scores: Vec<i16> = records.iter().map(|r| r.wellness_score).collect();
    assert_eq!(scores, vec![80, 60, 20]);

    let stats = aggregate_records(&records);
    assert_eq!(stats.count, 3);
    assert!((stats.average_score - 53.333).abs() < 0.01);
    assert_eq!(stats.bucket("Stable"), 1);
    assert_eq!(stats.bucket("Mild"), 1);
    assert_eq!(stats.bucket("Moderate"), 0);
    assert_eq!(stats.bucket("Severe"), 1);
    assert_eq!(stats.bucket_counts.len(), 4);
}

#[tokio::test]
async fn regional_rollup_orders_by_average() {
    let store = MemoryStore::new();
    // 90, 70 and 50
    stage(&store, &mental_health(&[5, 5, 5, 5, 5, 5, 4, 4, 4, 4, 4, 4], "A", AgeGroup::From45To54), now());
    stage(&store, &mental_health(&[4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 3, 3], "A", AgeGroup::From45To54), now());
    stage(&store, &mental_health(&[3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2], "B", AgeGroup::From45To54), now());

    let records: Vec<MentalHealthRecord> = store
        .query(SurveyTable::MentalHealth, QueryFilter::all())
        .await
        .expect("query")
        .into_iter()
        .filter_map(SurveyRecord::into_mental_health)
        .collect();

    let stats = aggregate_records(&records);
    let regions: Vec<(&str, f64, usize)> = stats
        .regional_breakdown
        .iter()
        .map(|r| (r.region.as_str(), r.average_score, r.count))
        .collect();
    assert_eq!(regions, vec![("A", 80.0, 2), ("B", 50.0, 1)]);
}

#[tokio::test]
async fn dashboards_respect_the_time_window() {
    let store = MemoryStore::new();
    let recent = now() - chrono::Duration::days(2);
    let last_month = now() - chrono::Duration::days(20);
    let ancient = now() - chrono::Duration::days(90);

    stage(&store, &mental_health(&[5; 12], "North", AgeGroup::From25To34), recent);
    stage(&store, &mental_health(&[3; 12], "South", AgeGroup::From25To34), last_month);
    stage(&store, &mental_health(&[1; 12], "South", AgeGroup::From25To34), ancient);

    let week = load_mental_health_dashboard(&store, TimeWindow::Week, now(), TIMEOUT).await;
    assert_eq!(week.stats.count, 1);
    assert_eq!(week.average_score, 100);
    assert_eq!(week.trend, WellnessTrend::Up);

    let month = load_mental_health_dashboard(&store, TimeWindow::Month, now(), TIMEOUT).await;
    assert_eq!(month.stats.count, 2);
    assert_eq!(month.average_score, 80);

    let all = load_mental_health_dashboard(&store, TimeWindow::AllTime, now(), TIMEOUT).await;
    assert_eq!(all.stats.count, 3);
    assert_eq!(all.average_score, 60);
    assert_eq!(all.stats.bucket_percentage("Severe"), 33);
    assert!(all.error.is_none());
}

#[tokio::test]
async fn phobia_dashboard_drills_into_most_assessed_type() {
    let store = MemoryStore::new();
    stage(&store, &phobia(PhobiaType::Aerophobia, &[2, 2, 2, 2], "East"), now());
    stage(&store, &phobia(PhobiaType::Hemophobia, &[4, 4, 4, 4], "East"), now());
    stage(&store, &phobia(PhobiaType::Hemophobia, &[5, 5, 5, 5], "West"), now());

    let dashboard =
        load_phobia_dashboard(&store, TimeWindow::AllTime, now(), None, TIMEOUT).await;
    assert_eq!(dashboard.overview.len(), 2);
    assert_eq!(dashboard.selected, Some(PhobiaType::Hemophobia));

    let entry = dashboard.selected_entry().expect("selected");
    assert_eq!(entry.total_assessments(), 2);
    assert_eq!(entry.average_intensity(), 90);
    assert_eq!(entry.stats.regional_breakdown[0].region, "West");
    assert!(dashboard.failed.is_empty());
}

#[tokio::test]
async fn admin_summary_survives_failing_and_stalled_tables() {
    let inner = MemoryStore::new();
    stage(&inner, &mental_health(&[1; 12], "North", AgeGroup::From55To64), now());
    stage(&inner, &mental_health(&[4; 12], "South", AgeGroup::From55To64), now());
    stage(&inner, &phobia(PhobiaType::Acrophobia, &[3, 3, 3, 3], "North"), now());
    stage(&inner, &phobia(PhobiaType::Aquaphobia, &[3, 3, 3, 3], "North"), now());
    stage(&inner, &phobia(PhobiaType::Hemophobia, &[3, 3, 3, 3], "North"), now());

    let store = UnreliableStore {
        inner,
        failing: vec![SurveyTable::Phobia(PhobiaType::Aquaphobia)],
        stalled: vec![SurveyTable::Phobia(PhobiaType::Hemophobia)],
    };

    let summary = load_admin_summary(&store, &admin(), QueryFilter::all(), TIMEOUT).await;
    assert_eq!(summary.mental_health_responses, 2);
    assert_eq!(summary.critical_cases, 1);
    assert_eq!(summary.active_regions, 2);
    assert_eq!(summary.phobia_assessments, 1);
    assert_eq!(
        summary.failed_sources,
        vec!["hemophobia_assessments", "aquaphobia_assessments"]
    );

    let dashboard =
        load_phobia_dashboard(&store, TimeWindow::AllTime, now(), None, TIMEOUT).await;
    assert_eq!(dashboard.failed, vec![PhobiaType::Hemophobia, PhobiaType::Aquaphobia]);
    assert_eq!(dashboard.selected, Some(PhobiaType::Acrophobia));
}

#[tokio::test]
async fn mental_health_dashboard_reports_load_failure() {
    let store = UnreliableStore {
        inner: MemoryStore::new(),
        failing: vec![SurveyTable::MentalHealth],
        stalled: Vec::new(),
    };
    let dashboard =
        load_mental_health_dashboard(&store, TimeWindow::Week, now(), TIMEOUT).await;
    assert_eq!(dashboard.stats.count, 0);
    assert!(dashboard.error.is_some());
}

#[tokio::test]
async fn csv_export_round_trips_awkward_regions() {
    let store = MemoryStore::new();
    let region = "Old Town, \"East\"\nBlock 4";
    stage(&store, &mental_health(&[2; 12], region, AgeGroup::From18To24), now());
    stage(&store, &mental_health(&[5; 12], "Plain", AgeGroup::Over65), now());

    let request = ExportRequest {
        table: SurveyTable::MentalHealth,
        format: ExportFormat::Csv,
        with_metadata: false,
    };
    let file = export_table(&store, &admin(), request, now()).await.expect("export");
    assert_eq!(file.filename, "mental_health_2026-06-15.csv");
    assert_eq!(file.mime_type, "text/csv");
    assert_eq!(file.record_count, 2);

    let mut reader = csv::Reader::from_reader(file.content.as_bytes());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.len(), 18);
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[17], "submitted_at");

    let parsed: Vec<MentalHealthRecord> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("rows parse back");
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].region, region);
    assert_eq!(parsed[0].wellness_score, 40);
    assert_eq!(parsed[0].age_group, AgeGroup::From18To24);
    assert_eq!(parsed[1].severity_category, SeverityCategory::Stable);
    assert_eq!(parsed[1].submitted_at, now());
}

#[tokio::test]
async fn json_export_wraps_records_with_metadata() {
    let store = MemoryStore::new();
    stage(&store, &phobia(PhobiaType::Cynophobia, &[1, 2, 3, 4], "Hills"), now());

    let request = ExportRequest {
        table: SurveyTable::Phobia(PhobiaType::Cynophobia),
        format: ExportFormat::Json,
        with_metadata: true,
    };
    let file = export_table(&store, &admin(), request, now()).await.expect("export");
    assert_eq!(file.filename, "cynophobia_2026-06-15.json");

    let value: serde_json::Value = serde_json::from_str(&file.content).expect("json");
    assert_eq!(value["metadata"]["data_type"], "cynophobia");
    assert_eq!(value["metadata"]["record_count"], 1);
    assert_eq!(value["metadata"]["exported_by"], "Admin Panel");
    assert_eq!(value["records"][0]["region"], "Hills");
    assert_eq!(value["records"][0]["intensity_percentage"], 50);
}

#[tokio::test]
async fn empty_table_export_is_refused() {
    let store = MemoryStore::new();
    let request = ExportRequest {
        table: SurveyTable::Phobia(PhobiaType::Acrophobia),
        format: ExportFormat::Csv,
        with_metadata: false,
    };
    let err = export_table(&store, &admin(), request, now())
        .await
        .expect_err("nothing to export");
    assert!(matches!(err, ExportError::Empty { data_type: "acrophobia" }));
}

#[test]
fn admin_capability_requires_matching_token() {
    let anonymous = TokenIdentity::new(Some("pulse-admin".into()), None);
    assert!(AdminCapability::issue(&anonymous).is_none());
}
