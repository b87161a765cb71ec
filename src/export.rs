//! CSV and JSON serialization of raw survey tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use tracing::info;

use crate::auth::AdminCapability;
use crate::error::{ExportError, ValidationError};
use crate::models::{MentalHealthRecord, PhobiaRecord, SurveyRecord, SurveyTable};
use crate::store::{QueryFilter, RecordStore};

/// A record type with a fixed column layout.
pub trait CsvRow: Serialize {
    /// Column names in field declaration order.
    const HEADERS: &'static [&'static str];
}

impl CsvRow for MentalHealthRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "stress_level",
        "anxiety_level",
        "mood_level",
        "sleep_quality",
        "focus_ability",
        "emotional_regulation",
        "social_connection",
        "physical_energy",
        "motivation_level",
        "appetite_changes",
        "intrusive_thoughts",
        "hopelessness_feeling",
        "wellness_score",
        "severity_category",
        "region",
        "age_group",
        "submitted_at",
    ];
}

impl CsvRow for PhobiaRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "frequency_of_fear",
        "avoidance_level",
        "physical_symptoms_intensity",
        "interference_with_life",
        "duration_months",
        "intensity_percentage",
        "risk_level",
        "region",
        "age_group",
        "submitted_at",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ValidationError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<data_type>_<YYYY-MM-DD>.<ext>`
pub fn export_filename(data_type: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}_{}.{}", data_type, date.format("%Y-%m-%d"), format.extension())
}

/// Header row always quoted; data fields quoted only when they contain a
/// delimiter, quote or line break. `None` fields are empty. Empty input gives
/// an empty string.
pub fn to_csv<T: CsvRow>(records: &[T]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(T::HEADERS)?;
    let buffer = header
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;

    let mut rows = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer);
    for record in records {
        rows.serialize(record)?;
    }
    let bytes = rows
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;

    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

pub fn to_json<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub data_type: &'static str,
    pub record_count: usize,
    pub exported_by: &'static str,
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T> {
    metadata: ExportMetadata,
    records: &'a [T],
}

/// Pretty JSON with a metadata header object.
pub fn to_json_with_metadata<T: Serialize>(
    records: &[T],
    data_type: &'static str,
    exported_at: DateTime<Utc>,
) -> Result<String, ExportError> {
    let envelope = JsonEnvelope {
        metadata: ExportMetadata {
            exported_at,
            data_type,
            record_count: records.len(),
            exported_by: "Admin Panel",
        },
        records,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// A rendered export ready to hand to a download surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub record_count: usize,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub table: SurveyTable,
    pub format: ExportFormat,
    pub with_metadata: bool,
}

/// Fetch a whole table and render it. Empty tables are rejected.
pub async fn export_table<S>(
    store: &S,
    _admin: &AdminCapability,
    request: ExportRequest,
    now: DateTime<Utc>,
) -> Result<ExportFile, ExportError>
where
    S: RecordStore + ?Sized,
{
    let rows = store.query(request.table, QueryFilter::all()).await?;
    let data_type = request.table.data_type();
    if rows.is_empty() {
        return Err(ExportError::Empty { data_type });
    }
    let record_count = rows.len();

    let content = match request.table {
        SurveyTable::MentalHealth => {
            let records: Vec<MentalHealthRecord> =
                rows.into_iter().filter_map(SurveyRecord::into_mental_health).collect();
            render(&records, request, data_type, now)?
        }
        SurveyTable::Phobia(_) => {
            let records: Vec<PhobiaRecord> =
                rows.into_iter().filter_map(SurveyRecord::into_phobia).collect();
            render(&records, request, data_type, now)?
        }
    };

    let file = ExportFile {
        filename: export_filename(data_type, request.format, now.date_naive()),
        mime_type: request.format.mime_type(),
        record_count,
        content,
    };
    info!(
        data_type,
        format = %request.format,
        records = record_count,
        "export rendered"
    );
    Ok(file)
}

fn render<T: CsvRow>(
    records: &[T],
    request: ExportRequest,
    data_type: &'static str,
    now: DateTime<Utc>,
) -> Result<String, ExportError> {
    match (request.format, request.with_metadata) {
        (ExportFormat::Csv, _) => to_csv(records),
        (ExportFormat::Json, false) => to_json(records),
        (ExportFormat::Json, true) => to_json_with_metadata(records, data_type, now),
    }
}
