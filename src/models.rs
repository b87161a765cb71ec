use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::questionnaire::SurveyKind;

/// A single answer on the five-point ordinal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Likert(u8);

impl Likert {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Likert {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::ResponseOutOfRange(value))
        }
    }
}

/// Answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSet {
    answers: BTreeMap<&'static str, Likert>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a complete set from answers given in question order.
    pub fn from_values(kind: SurveyKind, values: &[u8]) -> Result<Self, ValidationError> {
        let questions = kind.questions();
        if values.len() != questions.len() {
            return Err(ValidationError::Incomplete {
                answered: values.len(),
                expected: questions.len(),
            });
        }

        let mut set = Self::new();
        for (question, value) in questions.iter().zip(values) {
            set.insert(question.id, Likert::new(*value)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, question_id: &'static str, value: Likert) {
        self.answers.insert(question_id, value);
    }

    pub fn remove(&mut self, question_id: &str) -> Option<Likert> {
        self.answers.remove(question_id)
    }

    pub fn get(&self, question_id: &str) -> Option<Likert> {
        self.answers.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn sum(&self) -> u32 {
        self.answers.values().map(|v| u32::from(v.value())).sum()
    }

    pub fn is_complete_for(&self, kind: SurveyKind) -> bool {
        kind.questions().iter().all(|q| self.answers.contains_key(q.id))
    }

    pub fn ensure_complete(&self, kind: SurveyKind) -> Result<(), ValidationError> {
        if self.is_complete_for(kind) {
            return Ok(());
        }
        let answered = kind
            .questions()
            .iter()
            .filter(|q| self.answers.contains_key(q.id))
            .count();
        Err(ValidationError::Incomplete {
            answered,
            expected: kind.question_count(),
        })
    }

    fn field(&self, question_id: &'static str) -> Result<i16, ValidationError> {
        self.get(question_id)
            .map(|v| i16::from(v.value()))
            .ok_or(ValidationError::Incomplete {
                answered: self.len(),
                expected: self.len() + 1,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    Over65,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::From18To24,
        AgeGroup::From25To34,
        AgeGroup::From35To44,
        AgeGroup::From45To54,
        AgeGroup::From55To64,
        AgeGroup::Over65,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::From18To24 => "18-24",
            AgeGroup::From25To34 => "25-34",
            AgeGroup::From35To44 => "35-44",
            AgeGroup::From45To54 => "45-54",
            AgeGroup::From55To64 => "55-64",
            AgeGroup::Over65 => "65+",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|group| group.label() == trimmed)
            .ok_or_else(|| ValidationError::UnknownAgeGroup(s.to_string()))
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wellness bucket. Lower scores are worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityCategory {
    Stable,
    Mild,
    Moderate,
    Severe,
}

impl SeverityCategory {
    pub const ALL: [SeverityCategory; 4] = [
        SeverityCategory::Stable,
        SeverityCategory::Mild,
        SeverityCategory::Moderate,
        SeverityCategory::Severe,
    ];
    pub const LABELS: [&'static str; 4] = ["Stable", "Mild", "Moderate", "Severe"];

    pub fn label(self) -> &'static str {
        match self {
            SeverityCategory::Stable => "Stable",
            SeverityCategory::Mild => "Mild",
            SeverityCategory::Moderate => "Moderate",
            SeverityCategory::Severe => "Severe",
        }
    }

    pub fn guidance(self) -> &'static [&'static str] {
        match self {
            SeverityCategory::Severe | SeverityCategory::Moderate => &[
                "Consider speaking with a mental health professional",
                "Practice daily mindfulness or meditation",
                "Maintain a regular sleep schedule",
            ],
            SeverityCategory::Mild => &[
                "Continue healthy habits that support your wellbeing",
                "Stay connected with supportive friends and family",
                "Engage in regular physical activity",
            ],
            SeverityCategory::Stable => &[
                "Keep up your excellent self-care practices",
                "Share your wellness strategies with others",
                "Continue monitoring your mental health",
            ],
        }
    }
}

impl FromStr for SeverityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phobia bucket. Higher intensity is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Severe,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Severe,
    ];
    pub const LABELS: [&'static str; 4] = ["Low", "Medium", "High", "Severe"];

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Severe => "Severe",
        }
    }

    pub fn guidance(self) -> &'static [&'static str] {
        match self {
            RiskLevel::Severe | RiskLevel::High => &[
                "Consider consulting with a mental health professional",
                "Cognitive Behavioral Therapy (CBT) has shown effectiveness",
                "Exposure therapy may be beneficial under professional guidance",
                "Join support groups for individuals with similar experiences",
            ],
            RiskLevel::Medium => &[
                "Practice relaxation techniques when confronting your fear",
                "Gradual exposure to the fear source can help build tolerance",
                "Consider speaking with a therapist if symptoms worsen",
                "Learn about your phobia to better understand it",
            ],
            RiskLevel::Low => &[
                "Your fear level is relatively manageable",
                "Continue healthy coping strategies",
                "Stay informed about your fear triggers",
                "Monitor for any changes in intensity",
            ],
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhobiaType {
    Acrophobia,
    Agoraphobia,
    SocialPhobia,
    Claustrophobia,
    Arachnophobia,
    Ophidiophobia,
    Aerophobia,
    Hemophobia,
    Cynophobia,
    Aquaphobia,
}

/// Catalog entry for a phobia variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhobiaTypeDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub medical_term: &'static str,
    pub description: &'static str,
    pub table_key: &'static str,
}

impl PhobiaType {
    pub const ALL: [PhobiaType; 10] = [
        PhobiaType::Acrophobia,
        PhobiaType::Agoraphobia,
        PhobiaType::SocialPhobia,
        PhobiaType::Claustrophobia,
        PhobiaType::Arachnophobia,
        PhobiaType::Ophidiophobia,
        PhobiaType::Aerophobia,
        PhobiaType::Hemophobia,
        PhobiaType::Cynophobia,
        PhobiaType::Aquaphobia,
    ];

    pub fn descriptor(self) -> PhobiaTypeDescriptor {
        match self {
            PhobiaType::Acrophobia => PhobiaTypeDescriptor {
                id: "acrophobia",
                display_name: "Fear of Heights",
                medical_term: "Acrophobia",
                description: "Extreme or irrational fear of heights",
                table_key: "acrophobia_assessments",
            },
            PhobiaType::Agoraphobia => PhobiaTypeDescriptor {
                id: "agoraphobia",
                display_name: "Fear of Open or Crowded Spaces",
                medical_term: "Agoraphobia",
                description: "Fear of situations where escape might be difficult",
                table_key: "agoraphobia_assessments",
            },
            PhobiaType::SocialPhobia => PhobiaTypeDescriptor {
                id: "social_phobia",
                display_name: "Fear of Social Situations",
                medical_term: "Social Phobia (Social Anxiety Disorder)",
                description: "Intense fear of social or performance situations",
                table_key: "social_phobia_assessments",
            },
            PhobiaType::Claustrophobia => PhobiaTypeDescriptor {
                id: "claustrophobia",
                display_name: "Fear of Confined Spaces",
                medical_term: "Claustrophobia",
                description: "Fear of enclosed or tight spaces",
                table_key: "claustrophobia_assessments",
            },
            PhobiaType::Arachnophobia => PhobiaTypeDescriptor {
                id: "arachnophobia",
                display_name: "Fear of Spiders",
                medical_term: "Arachnophobia",
                description: "Extreme or irrational fear of spiders",
                table_key: "arachnophobia_assessments",
            },
            PhobiaType::Ophidiophobia => PhobiaTypeDescriptor {
                id: "ophidiophobia",
                display_name: "Fear of Snakes",
                medical_term: "Ophidiophobia",
                description: "Extreme fear of snakes",
                table_key: "ophidiophobia_assessments",
            },
            PhobiaType::Aerophobia => PhobiaTypeDescriptor {
                id: "aerophobia",
                display_name: "Fear of Flying",
                medical_term: "Aerophobia",
                description: "Fear of flying or air travel",
                table_key: "aerophobia_assessments",
            },
            PhobiaType::Hemophobia => PhobiaTypeDescriptor {
                id: "hemophobia",
                display_name: "Fear of Blood",
                medical_term: "Hemophobia",
                description: "Extreme fear of blood",
                table_key: "hemophobia_assessments",
            },
            PhobiaType::Cynophobia => PhobiaTypeDescriptor {
                id: "cynophobia",
                display_name: "Fear of Dogs",
                medical_term: "Cynophobia",
                description: "Fear of dogs or canines",
                table_key: "cynophobia_assessments",
            },
            PhobiaType::Aquaphobia => PhobiaTypeDescriptor {
                id: "aquaphobia",
                display_name: "Fear of Water",
                medical_term: "Aquaphobia",
                description: "Fear of water, particularly large bodies of water",
                table_key: "aquaphobia_assessments",
            },
        }
    }

    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    pub fn table_key(self) -> &'static str {
        self.descriptor().table_key
    }
}

impl FromStr for PhobiaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.id() == wanted)
            .ok_or_else(|| ValidationError::UnknownPhobia(s.to_string()))
    }
}

impl fmt::Display for PhobiaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Storage partition. One mental-health table plus one table per phobia type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurveyTable {
    MentalHealth,
    Phobia(PhobiaType),
}

impl SurveyTable {
    pub const MENTAL_HEALTH_KEY: &'static str = "mental_health_responses";

    pub fn all() -> Vec<SurveyTable> {
        std::iter::once(SurveyTable::MentalHealth)
            .chain(PhobiaType::ALL.into_iter().map(SurveyTable::Phobia))
            .collect()
    }

    pub fn table_key(self) -> &'static str {
        match self {
            SurveyTable::MentalHealth => Self::MENTAL_HEALTH_KEY,
            SurveyTable::Phobia(phobia) => phobia.table_key(),
        }
    }

    /// Name used for export files.
    pub fn data_type(self) -> &'static str {
        match self {
            SurveyTable::MentalHealth => "mental_health",
            SurveyTable::Phobia(phobia) => phobia.id(),
        }
    }

    pub fn survey_kind(self) -> SurveyKind {
        match self {
            SurveyTable::MentalHealth => SurveyKind::MentalHealth,
            SurveyTable::Phobia(_) => SurveyKind::Phobia,
        }
    }
}

impl FromStr for SurveyTable {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("mental_health") || trimmed.eq_ignore_ascii_case("mental-health") {
            return Ok(SurveyTable::MentalHealth);
        }
        trimmed
            .parse::<PhobiaType>()
            .map(SurveyTable::Phobia)
            .map_err(|_| ValidationError::UnknownDataType(s.to_string()))
    }
}

impl fmt::Display for SurveyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_key())
    }
}

/// Scored mental-health answers awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentalHealthSubmission {
    pub stress_level: i16,
    pub anxiety_level: i16,
    pub mood_level: i16,
    pub sleep_quality: i16,
    pub focus_ability: i16,
    pub emotional_regulation: i16,
    pub social_connection: i16,
    pub physical_energy: i16,
    pub motivation_level: i16,
    pub appetite_changes: i16,
    pub intrusive_thoughts: i16,
    pub hopelessness_feeling: i16,
    pub wellness_score: i16,
    pub severity_category: SeverityCategory,
    pub region: String,
    pub age_group: AgeGroup,
}

impl MentalHealthSubmission {
    pub fn from_responses(
        responses: &ResponseSet,
        wellness_score: u8,
        severity_category: SeverityCategory,
        region: String,
        age_group: AgeGroup,
    ) -> Result<Self, ValidationError> {
        responses.ensure_complete(SurveyKind::MentalHealth)?;
        Ok(Self {
            stress_level: responses.field("stress_level")?,
            anxiety_level: responses.field("anxiety_level")?,
            mood_level: responses.field("mood_level")?,
            sleep_quality: responses.field("sleep_quality")?,
            focus_ability: responses.field("focus_ability")?,
            emotional_regulation: responses.field("emotional_regulation")?,
            social_connection: responses.field("social_connection")?,
            physical_energy: responses.field("physical_energy")?,
            motivation_level: responses.field("motivation_level")?,
            appetite_changes: responses.field("appetite_changes")?,
            intrusive_thoughts: responses.field("intrusive_thoughts")?,
            hopelessness_feeling: responses.field("hopelessness_feeling")?,
            wellness_score: i16::from(wellness_score),
            severity_category,
            region,
            age_group,
        })
    }

    pub fn into_record(self, id: Uuid, submitted_at: DateTime<Utc>) -> MentalHealthRecord {
        MentalHealthRecord {
            id,
            stress_level: self.stress_level,
            anxiety_level: self.anxiety_level,
            mood_level: self.mood_level,
            sleep_quality: self.sleep_quality,
            focus_ability: self.focus_ability,
            emotional_regulation: self.emotional_regulation,
            social_connection: self.social_connection,
            physical_energy: self.physical_energy,
            motivation_level: self.motivation_level,
            appetite_changes: self.appetite_changes,
            intrusive_thoughts: self.intrusive_thoughts,
            hopelessness_feeling: self.hopelessness_feeling,
            wellness_score: self.wellness_score,
            severity_category: self.severity_category,
            region: self.region,
            age_group: self.age_group,
            submitted_at,
        }
    }
}

/// Persisted row of `mental_health_responses`. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentalHealthRecord {
    pub id: Uuid,
    pub stress_level: i16,
    pub anxiety_level: i16,
    pub mood_level: i16,
    pub sleep_quality: i16,
    pub focus_ability: i16,
    pub emotional_regulation: i16,
    pub social_connection: i16,
    pub physical_energy: i16,
    pub motivation_level: i16,
    pub appetite_changes: i16,
    pub intrusive_thoughts: i16,
    pub hopelessness_feeling: i16,
    pub wellness_score: i16,
    pub severity_category: SeverityCategory,
    pub region: String,
    pub age_group: AgeGroup,
    pub submitted_at: DateTime<Utc>,
}

/// Scored phobia answers awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhobiaSubmission {
    pub frequency_of_fear: i16,
    pub avoidance_level: i16,
    pub physical_symptoms_intensity: i16,
    pub interference_with_life: i16,
    pub duration_months: i32,
    pub intensity_percentage: i16,
    pub risk_level: RiskLevel,
    pub region: String,
    pub age_group: AgeGroup,
}

impl PhobiaSubmission {
    pub fn from_responses(
        responses: &ResponseSet,
        duration_months: u32,
        intensity_percentage: u8,
        risk_level: RiskLevel,
        region: String,
        age_group: AgeGroup,
    ) -> Result<Self, ValidationError> {
        responses.ensure_complete(SurveyKind::Phobia)?;
        Ok(Self {
            frequency_of_fear: responses.field("frequency_of_fear")?,
            avoidance_level: responses.field("avoidance_level")?,
            physical_symptoms_intensity: responses.field("physical_symptoms_intensity")?,
            interference_with_life: responses.field("interference_with_life")?,
            duration_months: i32::try_from(duration_months).unwrap_or(i32::MAX),
            intensity_percentage: i16::from(intensity_percentage),
            risk_level,
            region,
            age_group,
        })
    }

    pub fn into_record(self, id: Uuid, submitted_at: DateTime<Utc>) -> PhobiaRecord {
        PhobiaRecord {
            id,
            frequency_of_fear: self.frequency_of_fear,
            avoidance_level: self.avoidance_level,
            physical_symptoms_intensity: self.physical_symptoms_intensity,
            interference_with_life: self.interference_with_life,
            duration_months: self.duration_months,
            intensity_percentage: self.intensity_percentage,
            risk_level: self.risk_level,
            region: self.region,
            age_group: self.age_group,
            submitted_at,
        }
    }
}

/// Persisted row of a `<phobia>_assessments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhobiaRecord {
    pub id: Uuid,
    pub frequency_of_fear: i16,
    pub avoidance_level: i16,
    pub physical_symptoms_intensity: i16,
    pub interference_with_life: i16,
    pub duration_months: i32,
    pub intensity_percentage: i16,
    pub risk_level: RiskLevel,
    pub region: String,
    pub age_group: AgeGroup,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewRecord {
    MentalHealth(MentalHealthSubmission),
    Phobia {
        phobia_type: PhobiaType,
        submission: PhobiaSubmission,
    },
}

impl NewRecord {
    pub fn table(&self) -> SurveyTable {
        match self {
            NewRecord::MentalHealth(_) => SurveyTable::MentalHealth,
            NewRecord::Phobia { phobia_type, .. } => SurveyTable::Phobia(*phobia_type),
        }
    }

    pub fn into_record(self, id: Uuid, submitted_at: DateTime<Utc>) -> SurveyRecord {
        match self {
            NewRecord::MentalHealth(submission) => {
                SurveyRecord::MentalHealth(submission.into_record(id, submitted_at))
            }
            NewRecord::Phobia {
                phobia_type,
                submission,
            } => SurveyRecord::Phobia {
                phobia_type,
                record: submission.into_record(id, submitted_at),
            },
        }
    }
}

/// A persisted record from any table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyRecord {
    MentalHealth(MentalHealthRecord),
    Phobia {
        phobia_type: PhobiaType,
        record: PhobiaRecord,
    },
}

impl SurveyRecord {
    pub fn table(&self) -> SurveyTable {
        match self {
            SurveyRecord::MentalHealth(_) => SurveyTable::MentalHealth,
            SurveyRecord::Phobia { phobia_type, .. } => SurveyTable::Phobia(*phobia_type),
        }
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        match self {
            SurveyRecord::MentalHealth(record) => record.submitted_at,
            SurveyRecord::Phobia { record, .. } => record.submitted_at,
        }
    }

    pub fn into_mental_health(self) -> Option<MentalHealthRecord> {
        match self {
            SurveyRecord::MentalHealth(record) => Some(record),
            SurveyRecord::Phobia { .. } => None,
        }
    }

    pub fn into_phobia(self) -> Option<PhobiaRecord> {
        match self {
            SurveyRecord::Phobia { record, .. } => Some(record),
            SurveyRecord::MentalHealth(_) => None,
        }
    }
}
