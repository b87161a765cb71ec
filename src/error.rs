use std::time::Duration;

use thiserror::Error;

/// Rejected input. Nothing is written when one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("response {0} is outside the 1-5 scale")]
    ResponseOutOfRange(i64),
    #[error("{action} is not allowed while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("select a phobia type before answering")]
    PhobiaNotSelected,
    #[error("region is required")]
    MissingRegion,
    #[error("age group is required")]
    MissingAgeGroup,
    #[error("duration in months is required")]
    MissingDuration,
    #[error("response set is incomplete: {answered} of {expected} questions answered")]
    Incomplete { answered: usize, expected: usize },
    #[error("unknown age group '{0}'")]
    UnknownAgeGroup(String),
    #[error("unknown phobia type '{0}'")]
    UnknownPhobia(String),
    #[error("unknown time window '{0}' (expected week, month or all)")]
    UnknownWindow(String),
    #[error("unknown export format '{0}' (expected csv or json)")]
    UnknownFormat(String),
    #[error("unknown data type '{0}'")]
    UnknownDataType(String),
}

/// Failure reported by the record store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("query against {table} timed out after {after:?}")]
    Timeout {
        table: &'static str,
        after: Duration,
    },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row in {table}: {reason}")]
    Malformed { table: &'static str, reason: String },
}

/// Outcome of a failed survey submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to save your response, please try again: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no {data_type} records available to export")]
    Empty { data_type: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export produced invalid utf-8")]
    Encoding,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set to a Postgres instance")]
    MissingDatabaseUrl,
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}
