//! Walks a respondent through one survey and submits the scored result.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SubmitError, ValidationError};
use crate::models::{
    AgeGroup, Likert, MentalHealthSubmission, NewRecord, PhobiaSubmission, PhobiaType,
    ResponseSet, SurveyRecord,
};
use crate::questionnaire::{QuestionDescriptor, SurveyKind};
use crate::scoring;
use crate::store::RecordStore;

pub const MENTAL_HEALTH_DISCLAIMER: &str = "This is not a clinical diagnosis. If you're experiencing distress, please consult a healthcare professional.";
pub const PHOBIA_DISCLAIMER: &str = "This is an educational assessment, not a clinical diagnosis. Consult a healthcare professional for proper evaluation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Phobia surveys only: waiting for the variant to be chosen.
    PhobiaSelection,
    Question(usize),
    Demographics,
    Submitted,
}

impl CollectorState {
    fn describe(self) -> &'static str {
        match self {
            CollectorState::PhobiaSelection => "selecting a phobia type",
            CollectorState::Question(_) => "answering questions",
            CollectorState::Demographics => "collecting demographics",
            CollectorState::Submitted => "already submitted",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub region: Option<String>,
    pub age_group: Option<AgeGroup>,
    /// Phobia surveys only.
    pub duration_months: Option<u32>,
}

/// What the respondent sees after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub survey: SurveyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phobia_type: Option<PhobiaType>,
    pub score: u8,
    pub label: &'static str,
    pub guidance: &'static [&'static str],
    pub disclaimer: &'static str,
}

#[derive(Debug, Clone)]
pub struct ResponseCollector {
    survey: SurveyKind,
    phobia_type: Option<PhobiaType>,
    state: CollectorState,
    responses: ResponseSet,
    demographics: Demographics,
}

impl ResponseCollector {
    pub fn mental_health() -> Self {
        Self {
            survey: SurveyKind::MentalHealth,
            phobia_type: None,
            state: CollectorState::Question(0),
            responses: ResponseSet::new(),
            demographics: Demographics::default(),
        }
    }

    pub fn phobia() -> Self {
        Self {
            survey: SurveyKind::Phobia,
            phobia_type: None,
            state: CollectorState::PhobiaSelection,
            responses: ResponseSet::new(),
            demographics: Demographics::default(),
        }
    }

    pub fn survey(&self) -> SurveyKind {
        self.survey
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn phobia_type(&self) -> Option<PhobiaType> {
        self.phobia_type
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn current_question(&self) -> Option<&'static QuestionDescriptor> {
        match self.state {
            CollectorState::Question(index) => self.survey.questions().get(index),
            _ => None,
        }
    }

    /// (answered so far, total questions)
    pub fn progress(&self) -> (usize, usize) {
        (self.responses.len(), self.survey.question_count())
    }

    pub fn select_phobia(&mut self, phobia: PhobiaType) -> Result<CollectorState, ValidationError> {
        if self.state != CollectorState::PhobiaSelection {
            return Err(self.illegal("selecting a phobia type"));
        }
        self.phobia_type = Some(phobia);
        self.state = CollectorState::Question(0);
        Ok(self.state)
    }

    /// Record an answer for the current question and move forward.
    pub fn answer(&mut self, value: u8) -> Result<CollectorState, ValidationError> {
        let index = match self.state {
            CollectorState::Question(index) => index,
            CollectorState::PhobiaSelection => return Err(ValidationError::PhobiaNotSelected),
            _ => return Err(self.illegal("answering")),
        };
        let likert = Likert::new(value)?;
        let questions = self.survey.questions();
        self.responses.insert(questions[index].id, likert);

        self.state = if index + 1 < questions.len() {
            CollectorState::Question(index + 1)
        } else {
            CollectorState::Demographics
        };
        Ok(self.state)
    }

    /// Step back one question. Earlier answers are kept so they can be revised.
    pub fn previous(&mut self) -> Result<CollectorState, ValidationError> {
        match self.state {
            CollectorState::Question(index) if index > 0 => {
                self.state = CollectorState::Question(index - 1);
                Ok(self.state)
            }
            _ => Err(self.illegal("going back")),
        }
    }

    pub fn set_region(&mut self, region: impl Into<String>) -> Result<(), ValidationError> {
        self.require_demographics("setting region")?;
        let region = region.into();
        let trimmed = region.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingRegion);
        }
        self.demographics.region = Some(trimmed.to_string());
        Ok(())
    }

    pub fn set_age_group(&mut self, age_group: AgeGroup) -> Result<(), ValidationError> {
        self.require_demographics("setting age group")?;
        self.demographics.age_group = Some(age_group);
        Ok(())
    }

    pub fn set_duration_months(&mut self, months: u32) -> Result<(), ValidationError> {
        self.require_demographics("setting duration")?;
        if self.survey != SurveyKind::Phobia {
            return Err(self.illegal("setting duration"));
        }
        self.demographics.duration_months = Some(months);
        Ok(())
    }

    /// Validate and score without persisting.
    pub fn finalize(&self) -> Result<(NewRecord, SubmissionReceipt), ValidationError> {
        self.require_demographics("submitting")?;
        self.responses.ensure_complete(self.survey)?;
        let region = self
            .demographics
            .region
            .clone()
            .ok_or(ValidationError::MissingRegion)?;
        let age_group = self
            .demographics
            .age_group
            .ok_or(ValidationError::MissingAgeGroup)?;
        let question_count = self.survey.question_count();

        match self.survey {
            SurveyKind::MentalHealth => {
                let (score, category) = scoring::score_mental_health(&self.responses, question_count);
                let submission = MentalHealthSubmission::from_responses(
                    &self.responses,
                    score,
                    category,
                    region,
                    age_group,
                )?;
                let receipt = SubmissionReceipt {
                    survey: self.survey,
                    phobia_type: None,
                    score,
                    label: category.label(),
                    guidance: category.guidance(),
                    disclaimer: MENTAL_HEALTH_DISCLAIMER,
                };
                Ok((NewRecord::MentalHealth(submission), receipt))
            }
            SurveyKind::Phobia => {
                let phobia_type = self.phobia_type.ok_or(ValidationError::PhobiaNotSelected)?;
                let duration = self
                    .demographics
                    .duration_months
                    .ok_or(ValidationError::MissingDuration)?;
                let (intensity, risk) = scoring::score_phobia(&self.responses, question_count);
                let submission = PhobiaSubmission::from_responses(
                    &self.responses,
                    duration,
                    intensity,
                    risk,
                    region,
                    age_group,
                )?;
                let receipt = SubmissionReceipt {
                    survey: self.survey,
                    phobia_type: Some(phobia_type),
                    score: intensity,
                    label: risk.label(),
                    guidance: risk.guidance(),
                    disclaimer: PHOBIA_DISCLAIMER,
                };
                Ok((
                    NewRecord::Phobia {
                        phobia_type,
                        submission,
                    },
                    receipt,
                ))
            }
        }
    }

    /// Score and persist in one insert. On any error the collector stays in
    /// `Demographics` so the respondent can resubmit.
    pub async fn submit<S>(
        &mut self,
        store: &S,
    ) -> Result<(SurveyRecord, SubmissionReceipt), SubmitError>
    where
        S: RecordStore + ?Sized,
    {
        let (record, receipt) = self.finalize()?;
        let table = record.table();
        debug!(table = table.table_key(), "submitting survey response");

        match store.insert(record).await {
            Ok(stored) => {
                self.state = CollectorState::Submitted;
                info!(
                    table = table.table_key(),
                    score = receipt.score,
                    label = receipt.label,
                    "survey response stored"
                );
                Ok((stored, receipt))
            }
            Err(err) => {
                warn!(table = table.table_key(), error = %err, "survey insert failed");
                Err(SubmitError::Store(err))
            }
        }
    }

    fn require_demographics(&self, action: &'static str) -> Result<(), ValidationError> {
        if self.state == CollectorState::Demographics {
            Ok(())
        } else {
            Err(self.illegal(action))
        }
    }

    fn illegal(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            action,
            state: self.state.describe(),
        }
    }
}
