//! Record store contract plus an in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Months, Utc};
use futures::future::join_all;
use tracing::warn;
use uuid::Uuid;

use crate::error::{StoreError, ValidationError};
use crate::models::{
    MentalHealthRecord, NewRecord, PhobiaRecord, PhobiaType, SurveyRecord, SurveyTable,
};

/// Dashboard time range. Resolved to a minimum timestamp before querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    Week,
    Month,
    #[default]
    AllTime,
}

impl TimeWindow {
    /// Lower bound for `submitted_at`, or `None` for all time.
    /// A month is a calendar month back, clamped to the end of shorter months.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::Week => Some(now - Duration::days(7)),
            TimeWindow::Month => now.checked_sub_months(Months::new(1)),
            TimeWindow::AllTime => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Week => "last 7 days",
            TimeWindow::Month => "last month",
            TimeWindow::AllTime => "all time",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "7d" => Ok(TimeWindow::Week),
            "month" | "30d" => Ok(TimeWindow::Month),
            "all" | "all-time" | "all_time" => Ok(TimeWindow::AllTime),
            _ => Err(ValidationError::UnknownWindow(s.to_string())),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryFilter {
    pub since: Option<DateTime<Utc>>,
}

impl QueryFilter {
    pub fn all() -> Self {
        Self { since: None }
    }

    pub fn since(since: DateTime<Utc>) -> Self {
        Self { since: Some(since) }
    }

    pub fn for_window(window: TimeWindow, now: DateTime<Utc>) -> Self {
        Self {
            since: window.since(now),
        }
    }

    pub fn matches(&self, submitted_at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| submitted_at >= since)
    }
}

/// Insert/select access to the eleven survey tables.
///
/// Implementations assign `id` and `submitted_at`. Errors are reported as-is;
/// there is no retry at this boundary.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: NewRecord) -> Result<SurveyRecord, StoreError>;

    async fn query(
        &self,
        table: SurveyTable,
        filter: QueryFilter,
    ) -> Result<Vec<SurveyRecord>, StoreError>;
}

/// Query one table, failing with [`StoreError::Timeout`] once `timeout` elapses.
pub async fn query_with_timeout<S>(
    store: &S,
    table: SurveyTable,
    filter: QueryFilter,
    timeout: StdDuration,
) -> Result<Vec<SurveyRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let result = match tokio::time::timeout(timeout, store.query(table, filter)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            table: table.table_key(),
            after: timeout,
        }),
    };
    if let Err(err) = &result {
        warn!(table = table.table_key(), error = %err, "record store query failed");
    }
    result
}

pub async fn fetch_mental_health<S>(
    store: &S,
    filter: QueryFilter,
    timeout: StdDuration,
) -> Result<Vec<MentalHealthRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = query_with_timeout(store, SurveyTable::MentalHealth, filter, timeout).await?;
    Ok(rows
        .into_iter()
        .filter_map(SurveyRecord::into_mental_health)
        .collect())
}

/// Query all ten phobia tables concurrently. Every fetch settles before this
/// returns; results come back in catalog order.
pub async fn fetch_phobia_tables<S>(
    store: &S,
    filter: QueryFilter,
    timeout: StdDuration,
) -> Vec<(PhobiaType, Result<Vec<PhobiaRecord>, StoreError>)>
where
    S: RecordStore + ?Sized,
{
    let fetches = PhobiaType::ALL.into_iter().map(|phobia| async move {
        let rows = query_with_timeout(store, SurveyTable::Phobia(phobia), filter, timeout)
            .await
            .map(|rows| rows.into_iter().filter_map(SurveyRecord::into_phobia).collect());
        (phobia, rows)
    });
    join_all(fetches).await
}

/// Volatile store used by tests and the offline demo.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<SurveyTable, Vec<SurveyRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with an explicit timestamp, bypassing the clock.
    pub fn insert_at(
        &self,
        record: NewRecord,
        submitted_at: DateTime<Utc>,
    ) -> Result<SurveyRecord, StoreError> {
        let stored = record.into_record(Uuid::new_v4(), submitted_at);
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        tables.entry(stored.table()).or_default().push(stored.clone());
        Ok(stored)
    }

    pub fn len(&self, table: SurveyTable) -> usize {
        self.tables
            .lock()
            .map(|tables| tables.get(&table).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: NewRecord) -> Result<SurveyRecord, StoreError> {
        self.insert_at(record, Utc::now())
    }

    async fn query(
        &self,
        table: SurveyTable,
        filter: QueryFilter,
    ) -> Result<Vec<SurveyRecord>, StoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.matches(row.submitted_at()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
