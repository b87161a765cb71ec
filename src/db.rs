use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AgeGroup, MentalHealthRecord, MentalHealthSubmission, NewRecord, PhobiaRecord,
    PhobiaSubmission, PhobiaType, ResponseSet, RiskLevel, SeverityCategory, SurveyRecord,
    SurveyTable,
};
use crate::questionnaire::SurveyKind;
use crate::scoring::{score_mental_health, score_phobia};
use crate::store::{QueryFilter, RecordStore};

const SCHEMA: &str = "community_pulse";

const MENTAL_HEALTH_COLUMNS: &str = "id, stress_level, anxiety_level, mood_level, sleep_quality, \
     focus_ability, emotional_regulation, social_connection, physical_energy, motivation_level, \
     appetite_changes, intrusive_thoughts, hopelessness_feeling, wellness_score, \
     severity_category, region, age_group, submitted_at";

const PHOBIA_COLUMNS: &str = "id, frequency_of_fear, avoidance_level, physical_symptoms_intensity, \
     interference_with_life, duration_months, intensity_percentage, risk_level, region, \
     age_group, submitted_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed [`RecordStore`]. Each survey table lives in the
/// `community_pulse` schema under its table key.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert under a caller-chosen id. Returns `None` when the id already exists.
    async fn write(&self, id: Uuid, record: NewRecord) -> Result<Option<SurveyRecord>, StoreError> {
        let table = record.table();
        let submitted_at: Option<DateTime<Utc>> = match &record {
            NewRecord::MentalHealth(s) => {
                let sql = format!(
                    "INSERT INTO {SCHEMA}.{} \
                     (id, stress_level, anxiety_level, mood_level, sleep_quality, focus_ability, \
                      emotional_regulation, social_connection, physical_energy, motivation_level, \
                      appetite_changes, intrusive_thoughts, hopelessness_feeling, wellness_score, \
                      severity_category, region, age_group) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
                     ON CONFLICT (id) DO NOTHING \
                     RETURNING submitted_at",
                    table.table_key()
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(s.stress_level)
                    .bind(s.anxiety_level)
                    .bind(s.mood_level)
                    .bind(s.sleep_quality)
                    .bind(s.focus_ability)
                    .bind(s.emotional_regulation)
                    .bind(s.social_connection)
                    .bind(s.physical_energy)
                    .bind(s.motivation_level)
                    .bind(s.appetite_changes)
                    .bind(s.intrusive_thoughts)
                    .bind(s.hopelessness_feeling)
                    .bind(s.wellness_score)
                    .bind(s.severity_category.label())
                    .bind(&s.region)
                    .bind(s.age_group.label())
                    .fetch_optional(&self.pool)
                    .await?
                    .map(|row| row.try_get::<DateTime<Utc>, _>("submitted_at"))
                    .transpose()?
            }
            NewRecord::Phobia { submission: s, .. } => {
                let sql = format!(
                    "INSERT INTO {SCHEMA}.{} \
                     (id, frequency_of_fear, avoidance_level, physical_symptoms_intensity, \
                      interference_with_life, duration_months, intensity_percentage, risk_level, \
                      region, age_group) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                     ON CONFLICT (id) DO NOTHING \
                     RETURNING submitted_at",
                    table.table_key()
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(s.frequency_of_fear)
                    .bind(s.avoidance_level)
                    .bind(s.physical_symptoms_intensity)
                    .bind(s.interference_with_life)
                    .bind(s.duration_months)
                    .bind(s.intensity_percentage)
                    .bind(s.risk_level.label())
                    .bind(&s.region)
                    .bind(s.age_group.label())
                    .fetch_optional(&self.pool)
                    .await?
                    .map(|row| row.try_get::<DateTime<Utc>, _>("submitted_at"))
                    .transpose()?
            }
        };

        Ok(submitted_at.map(|at| record.into_record(id, at)))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<SurveyRecord, StoreError> {
        let table = record.table();
        let stored = self
            .write(Uuid::new_v4(), record)
            .await?
            .ok_or_else(|| StoreError::Malformed {
                table: table.table_key(),
                reason: "insert returned no row".to_string(),
            })?;
        debug!(table = table.table_key(), "row inserted");
        Ok(stored)
    }

    async fn query(
        &self,
        table: SurveyTable,
        filter: QueryFilter,
    ) -> Result<Vec<SurveyRecord>, StoreError> {
        let columns = match table {
            SurveyTable::MentalHealth => MENTAL_HEALTH_COLUMNS,
            SurveyTable::Phobia(_) => PHOBIA_COLUMNS,
        };
        let mut query = format!("SELECT {columns} FROM {SCHEMA}.{}", table.table_key());
        if filter.since.is_some() {
            query.push_str(" WHERE submitted_at >= $1");
        }
        query.push_str(" ORDER BY submitted_at");

        let mut rows = sqlx::query(&query);
        if let Some(since) = filter.since {
            rows = rows.bind(since);
        }
        let rows = rows.fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = match table {
                SurveyTable::MentalHealth => SurveyRecord::MentalHealth(mental_health_row(&row)?),
                SurveyTable::Phobia(phobia_type) => SurveyRecord::Phobia {
                    phobia_type,
                    record: phobia_row(table, &row)?,
                },
            };
            records.push(record);
        }
        Ok(records)
    }
}

fn parse_age_group(table: SurveyTable, row: &PgRow) -> Result<AgeGroup, StoreError> {
    let raw: String = row.try_get("age_group")?;
    raw.parse::<AgeGroup>().map_err(|err| StoreError::Malformed {
        table: table.table_key(),
        reason: err.to_string(),
    })
}

fn mental_health_row(row: &PgRow) -> Result<MentalHealthRecord, StoreError> {
    let table = SurveyTable::MentalHealth;
    let severity_category: SeverityCategory = row
        .try_get::<String, _>("severity_category")?
        .parse::<SeverityCategory>()
        .map_err(|raw| StoreError::Malformed {
            table: table.table_key(),
            reason: format!("unknown severity category '{raw}'"),
        })?;

    Ok(MentalHealthRecord {
        id: row.try_get("id")?,
        stress_level: row.try_get("stress_level")?,
        anxiety_level: row.try_get("anxiety_level")?,
        mood_level: row.try_get("mood_level")?,
        sleep_quality: row.try_get("sleep_quality")?,
        focus_ability: row.try_get("focus_ability")?,
        emotional_regulation: row.try_get("emotional_regulation")?,
        social_connection: row.try_get("social_connection")?,
        physical_energy: row.try_get("physical_energy")?,
        motivation_level: row.try_get("motivation_level")?,
        appetite_changes: row.try_get("appetite_changes")?,
        intrusive_thoughts: row.try_get("intrusive_thoughts")?,
        hopelessness_feeling: row.try_get("hopelessness_feeling")?,
        wellness_score: row.try_get("wellness_score")?,
        severity_category,
        region: row.try_get("region")?,
        age_group: parse_age_group(table, row)?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

fn phobia_row(table: SurveyTable, row: &PgRow) -> Result<PhobiaRecord, StoreError> {
    let risk_level: RiskLevel = row
        .try_get::<String, _>("risk_level")?
        .parse::<RiskLevel>()
        .map_err(|raw| StoreError::Malformed {
            table: table.table_key(),
            reason: format!("unknown risk level '{raw}'"),
        })?;

    Ok(PhobiaRecord {
        id: row.try_get("id")?,
        frequency_of_fear: row.try_get("frequency_of_fear")?,
        avoidance_level: row.try_get("avoidance_level")?,
        physical_symptoms_intensity: row.try_get("physical_symptoms_intensity")?,
        interference_with_life: row.try_get("interference_with_life")?,
        duration_months: row.try_get("duration_months")?,
        intensity_percentage: row.try_get("intensity_percentage")?,
        risk_level,
        region: row.try_get("region")?,
        age_group: parse_age_group(table, row)?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

/// Load a small demonstration dataset. Re-running skips rows already present.
pub async fn seed(store: &PgRecordStore) -> anyhow::Result<usize> {
    let mental_health = vec![
        (
            "6f1c2a4e-8d0b-4c1e-9a53-1b7e2f0c9d11",
            [4, 4, 5, 4, 4, 5, 4, 4, 5, 4, 4, 5],
            "North District",
            AgeGroup::From25To34,
        ),
        (
            "a9e3b6d2-57c4-4f18-8b2a-3c6d9e0f1a22",
            [3, 3, 3, 2, 3, 3, 4, 3, 3, 3, 2, 3],
            "Riverside",
            AgeGroup::From45To54,
        ),
        (
            "c4d7e8f9-0a1b-4c2d-8e3f-5a6b7c8d9e33",
            [1, 2, 1, 2, 1, 1, 2, 1, 2, 1, 1, 1],
            "North District",
            AgeGroup::From18To24,
        ),
    ];

    let phobia = vec![
        (
            "1b2c3d4e-5f60-4718-a9b0-c1d2e3f4a544",
            PhobiaType::Acrophobia,
            [4, 3, 4, 3],
            24,
            "Riverside",
            AgeGroup::From35To44,
        ),
        (
            "2c3d4e5f-6071-4829-b0c1-d2e3f4a5b655",
            PhobiaType::SocialPhobia,
            [5, 5, 4, 5],
            60,
            "North District",
            AgeGroup::From18To24,
        ),
        (
            "3d4e5f60-7182-493a-81d2-e3f4a5b6c766",
            PhobiaType::Arachnophobia,
            [2, 2, 1, 1],
            6,
            "Harbor",
            AgeGroup::Over65,
        ),
    ];

    let mut inserted = 0usize;

    for (id, answers, region, age_group) in mental_health {
        let responses = ResponseSet::from_values(SurveyKind::MentalHealth, &answers)?;
        let (score, category) =
            score_mental_health(&responses, SurveyKind::MentalHealth.question_count());
        let submission = MentalHealthSubmission::from_responses(
            &responses,
            score,
            category,
            region.to_string(),
            age_group,
        )?;
        let written = store
            .write(Uuid::parse_str(id)?, NewRecord::MentalHealth(submission))
            .await
            .context("failed to seed mental health response")?;
        if written.is_some() {
            inserted += 1;
        }
    }

    for (id, phobia_type, answers, duration_months, region, age_group) in phobia {
        let responses = ResponseSet::from_values(SurveyKind::Phobia, &answers)?;
        let (intensity, risk) = score_phobia(&responses, SurveyKind::Phobia.question_count());
        let submission = PhobiaSubmission::from_responses(
            &responses,
            duration_months,
            intensity,
            risk,
            region.to_string(),
            age_group,
        )?;
        let written = store
            .write(
                Uuid::parse_str(id)?,
                NewRecord::Phobia {
                    phobia_type,
                    submission,
                },
            )
            .await
            .with_context(|| format!("failed to seed {} assessment", phobia_type.id()))?;
        if written.is_some() {
            inserted += 1;
        }
    }

    info!(inserted, "seed data loaded");
    Ok(inserted)
}
