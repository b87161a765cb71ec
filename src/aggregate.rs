use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::models::{MentalHealthRecord, PhobiaRecord, RiskLevel, SeverityCategory};

pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub average_score: f64,
    pub count: usize,
}

/// Summary statistics over one slice of records. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub count: usize,
    pub average_score: f64,
    /// Known buckets in scale order. Empty when there are no records.
    pub bucket_counts: Vec<BucketCount>,
    /// Sorted by descending average score; ties keep first-seen order.
    pub regional_breakdown: Vec<RegionSummary>,
    /// Records whose bucket label matched none of the known buckets.
    pub unrecognized: usize,
}

impl AggregateStats {
    pub fn bucket(&self, label: &str) -> usize {
        self.bucket_counts
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(label))
            .map_or(0, |b| b.count)
    }

    /// Total of the recognised buckets.
    pub fn categorized(&self) -> usize {
        self.bucket_counts.iter().map(|b| b.count).sum()
    }

    /// Whole-number share of the categorised total, 0 when nothing is categorised.
    pub fn bucket_percentage(&self, label: &str) -> u32 {
        let total = self.categorized();
        if total == 0 {
            return 0;
        }
        (self.bucket(label) as f64 / total as f64 * 100.0).round() as u32
    }

    pub fn rounded_average(&self) -> i64 {
        self.average_score.round() as i64
    }
}

/// Field access used by [`aggregate_records`].
pub trait Aggregatable {
    /// Known bucket labels in display order.
    const BUCKETS: &'static [&'static str];

    fn bucket_key(&self) -> &str;
    fn score_field(&self) -> f64;
    fn region(&self) -> &str;
}

impl Aggregatable for MentalHealthRecord {
    const BUCKETS: &'static [&'static str] = &SeverityCategory::LABELS;

    fn bucket_key(&self) -> &str {
        self.severity_category.label()
    }

    fn score_field(&self) -> f64 {
        f64::from(self.wellness_score)
    }

    fn region(&self) -> &str {
        &self.region
    }
}

impl Aggregatable for PhobiaRecord {
    const BUCKETS: &'static [&'static str] = &RiskLevel::LABELS;

    fn bucket_key(&self) -> &str {
        self.risk_level.label()
    }

    fn score_field(&self) -> f64 {
        f64::from(self.intensity_percentage)
    }

    fn region(&self) -> &str {
        &self.region
    }
}

pub fn aggregate_records<R: Aggregatable>(records: &[R]) -> AggregateStats {
    aggregate(
        records,
        R::BUCKETS,
        |r| r.bucket_key(),
        |r| r.score_field(),
        |r| r.region(),
    )
}

/// Reduce a pre-filtered slice.
///
/// Bucket labels compare case-insensitively against `buckets`; anything else
/// is counted in `count` and `unrecognized` but not in `bucket_counts`.
/// Blank regions group under [`UNKNOWN_REGION`].
pub fn aggregate<R, B, S, G>(
    records: &[R],
    buckets: &'static [&'static str],
    bucket_key: B,
    score_field: S,
    region_field: G,
) -> AggregateStats
where
    B: Fn(&R) -> &str,
    S: Fn(&R) -> f64,
    G: Fn(&R) -> &str,
{
    if records.is_empty() {
        return AggregateStats::default();
    }

    let mut bucket_counts: Vec<BucketCount> = buckets
        .iter()
        .map(|label| BucketCount {
            label: *label,
            count: 0,
        })
        .collect();
    let mut unrecognized = 0usize;
    let mut total = 0.0;

    let mut region_index: HashMap<String, usize> = HashMap::new();
    let mut regions: Vec<(String, f64, usize)> = Vec::new();

    for record in records {
        let score = score_field(record);
        total += score;

        let key = bucket_key(record);
        match bucket_counts
            .iter_mut()
            .find(|b| b.label.eq_ignore_ascii_case(key.trim()))
        {
            Some(bucket) => bucket.count += 1,
            None => unrecognized += 1,
        }

        let region = region_field(record).trim();
        let region = if region.is_empty() { UNKNOWN_REGION } else { region };
        let slot = match region_index.get(region) {
            Some(slot) => *slot,
            None => {
                region_index.insert(region.to_string(), regions.len());
                regions.push((region.to_string(), 0.0, 0));
                regions.len() - 1
            }
        };
        regions[slot].1 += score;
        regions[slot].2 += 1;
    }

    if unrecognized > 0 {
        warn!(unrecognized, "records with unrecognized bucket labels left out of bucket counts");
    }

    let mut regional_breakdown: Vec<RegionSummary> = regions
        .into_iter()
        .map(|(region, sum, count)| RegionSummary {
            region,
            average_score: sum / count as f64,
            count,
        })
        .collect();
    regional_breakdown.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    AggregateStats {
        count: records.len(),
        average_score: total / records.len() as f64,
        bucket_counts,
        regional_breakdown,
        unrecognized,
    }
}

/// Direction of community wellness implied by the mean score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessTrend {
    Up,
    Stable,
    Down,
}

impl WellnessTrend {
    pub fn from_average(average: f64) -> Self {
        if average > 60.0 {
            WellnessTrend::Up
        } else if average < 40.0 {
            WellnessTrend::Down
        } else {
            WellnessTrend::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WellnessTrend::Up => "improving",
            WellnessTrend::Stable => "steady",
            WellnessTrend::Down => "declining",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        bucket: &'static str,
        score: f64,
        region: &'static str,
    }

    fn row(bucket: &'static str, score: f64, region: &'static str) -> Row {
        Row {
            bucket,
            score,
            region,
        }
    }

    fn run(rows: &[Row]) -> AggregateStats {
        aggregate(
            rows,
            &SeverityCategory::LABELS,
            |r| r.bucket,
            |r| r.score,
            |r| r.region,
        )
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = run(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.bucket_counts.is_empty());
        assert!(stats.regional_breakdown.is_empty());
        assert_eq!(stats.bucket_percentage("Stable"), 0);
    }

    #[test]
    fn averages_and_buckets() {
        let stats = run(&[
            row("Stable", 80.0, "North"),
            row("Mild", 60.0, "North"),
            row("Severe", 20.0, "South"),
        ]);
        assert_eq!(stats.count, 3);
        assert!((stats.average_score - 53.333).abs() < 0.01);
        assert_eq!(stats.bucket("Stable"), 1);
        assert_eq!(stats.bucket("Mild"), 1);
        assert_eq!(stats.bucket("Moderate"), 0);
        assert_eq!(stats.bucket("Severe"), 1);
        assert_eq!(stats.rounded_average(), 53);
    }

    #[test]
    fn regional_rollup_sorts_by_average() {
        let stats = run(&[
            row("Stable", 90.0, "A"),
            row("Mild", 70.0, "A"),
            row("Mild", 50.0, "B"),
        ]);
        assert_eq!(
            stats.regional_breakdown,
            vec![
                RegionSummary {
                    region: "A".to_string(),
                    average_score: 80.0,
                    count: 2
                },
                RegionSummary {
                    region: "B".to_string(),
                    average_score: 50.0,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let stats = run(&[
            row("Mild", 55.0, "Zeta"),
            row("Mild", 55.0, "Alpha"),
            row("Stable", 90.0, "Mid"),
        ]);
        let order: Vec<_> = stats
            .regional_breakdown
            .iter()
            .map(|r| r.region.as_str())
            .collect();
        assert_eq!(order, vec!["Mid", "Zeta", "Alpha"]);
    }

    #[test]
    fn blank_regions_group_as_unknown() {
        let stats = run(&[row("Mild", 50.0, ""), row("Mild", 70.0, "  ")]);
        assert_eq!(stats.regional_breakdown.len(), 1);
        assert_eq!(stats.regional_breakdown[0].region, UNKNOWN_REGION);
        assert_eq!(stats.regional_breakdown[0].count, 2);
    }

    #[test]
    fn labels_match_case_insensitively_and_unknown_are_dropped() {
        let stats = run(&[
            row("stable", 80.0, "A"),
            row("SEVERE", 10.0, "A"),
            row("critical", 5.0, "A"),
        ]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.bucket("Stable"), 1);
        assert_eq!(stats.bucket("Severe"), 1);
        assert_eq!(stats.categorized(), 2);
        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.bucket_counts[0].label, "Stable");
    }

    #[test]
    fn count_and_average_ignore_order() {
        let rows = vec![
            row("Stable", 90.0, "A"),
            row("Mild", 61.0, "B"),
            row("Severe", 12.0, "C"),
            row("Moderate", 33.0, "A"),
        ];
        let forward = run(&rows);
        let mut reversed = rows.clone();
        reversed.reverse();
        let backward = run(&reversed);
        assert_eq!(forward.count, backward.count);
        assert!((forward.average_score - backward.average_score).abs() < 1e-9);
        assert_eq!(forward.bucket_counts, backward.bucket_counts);
    }

    #[test]
    fn percentages_round_against_categorised_total() {
        let stats = run(&[
            row("Stable", 80.0, "A"),
            row("Stable", 80.0, "A"),
            row("Mild", 60.0, "A"),
        ]);
        assert_eq!(stats.bucket_percentage("Stable"), 67);
        assert_eq!(stats.bucket_percentage("Mild"), 33);
        assert_eq!(stats.bucket_percentage("Severe"), 0);
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(WellnessTrend::from_average(60.1), WellnessTrend::Up);
        assert_eq!(WellnessTrend::from_average(60.0), WellnessTrend::Stable);
        assert_eq!(WellnessTrend::from_average(40.0), WellnessTrend::Stable);
        assert_eq!(WellnessTrend::from_average(39.9), WellnessTrend::Down);
    }
}
