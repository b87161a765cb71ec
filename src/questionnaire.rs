//! Static question tables for both survey types.

use serde::Serialize;

/// One ordinal question. Labels map to responses 1 through 5 in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionDescriptor {
    pub id: &'static str,
    pub prompt: &'static str,
    pub response_labels: [&'static str; 5],
}

impl QuestionDescriptor {
    /// Label for a response value, if it is on the scale.
    pub fn label_for(&self, value: u8) -> Option<&'static str> {
        match value {
            1..=5 => Some(self.response_labels[usize::from(value) - 1]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyKind {
    MentalHealth,
    Phobia,
}

impl SurveyKind {
    pub fn questions(self) -> &'static [QuestionDescriptor] {
        match self {
            SurveyKind::MentalHealth => &MENTAL_HEALTH_QUESTIONS,
            SurveyKind::Phobia => &PHOBIA_QUESTIONS,
        }
    }

    pub fn question_count(self) -> usize {
        self.questions().len()
    }

    pub fn label(self) -> &'static str {
        match self {
            SurveyKind::MentalHealth => "mental health",
            SurveyKind::Phobia => "phobia",
        }
    }
}

pub const MENTAL_HEALTH_QUESTIONS: [QuestionDescriptor; 12] = [
    QuestionDescriptor {
        id: "stress_level",
        prompt: "How would you rate your overall stress level in the past week?",
        response_labels: ["Very Low", "Low", "Moderate", "High", "Very High"],
    },
    QuestionDescriptor {
        id: "anxiety_level",
        prompt: "How often have you felt anxious or worried?",
        response_labels: ["Never", "Rarely", "Sometimes", "Often", "Always"],
    },
    QuestionDescriptor {
        id: "mood_level",
        prompt: "How would you describe your general mood?",
        response_labels: ["Very Poor", "Poor", "Neutral", "Good", "Excellent"],
    },
    QuestionDescriptor {
        id: "sleep_quality",
        prompt: "How would you rate your sleep quality?",
        response_labels: ["Very Poor", "Poor", "Fair", "Good", "Excellent"],
    },
    QuestionDescriptor {
        id: "focus_ability",
        prompt: "How easily can you concentrate and focus on tasks?",
        response_labels: ["Very Difficult", "Difficult", "Moderate", "Easy", "Very Easy"],
    },
    QuestionDescriptor {
        id: "emotional_regulation",
        prompt: "How well can you manage and control your emotions?",
        response_labels: ["Very Poorly", "Poorly", "Moderately", "Well", "Very Well"],
    },
    QuestionDescriptor {
        id: "social_connection",
        prompt: "How connected do you feel to friends, family, or community?",
        response_labels: [
            "Very Isolated",
            "Isolated",
            "Neutral",
            "Connected",
            "Very Connected",
        ],
    },
    QuestionDescriptor {
        id: "physical_energy",
        prompt: "How would you rate your physical energy levels?",
        response_labels: ["Exhausted", "Low", "Moderate", "High", "Very High"],
    },
    QuestionDescriptor {
        id: "motivation_level",
        prompt: "How motivated do you feel to accomplish daily tasks?",
        response_labels: ["Not at all", "Slightly", "Moderately", "Very", "Extremely"],
    },
    QuestionDescriptor {
        id: "appetite_changes",
        prompt: "Have you noticed any changes in your appetite?",
        response_labels: [
            "Significant Loss",
            "Some Loss",
            "No Change",
            "Some Increase",
            "Significant Increase",
        ],
    },
    QuestionDescriptor {
        id: "intrusive_thoughts",
        prompt: "How often do you experience unwanted or intrusive thoughts?",
        response_labels: ["Never", "Rarely", "Sometimes", "Often", "Constantly"],
    },
    QuestionDescriptor {
        id: "hopelessness_feeling",
        prompt: "How often do you feel hopeless about the future?",
        response_labels: ["Never", "Rarely", "Sometimes", "Often", "Always"],
    },
];

pub const PHOBIA_QUESTIONS: [QuestionDescriptor; 4] = [
    QuestionDescriptor {
        id: "frequency_of_fear",
        prompt: "How often do you experience fear related to this phobia?",
        response_labels: ["Never", "Rarely", "Sometimes", "Often", "Always"],
    },
    QuestionDescriptor {
        id: "avoidance_level",
        prompt: "How much do you avoid situations related to this fear?",
        response_labels: [
            "Never Avoid",
            "Rarely Avoid",
            "Sometimes Avoid",
            "Often Avoid",
            "Always Avoid",
        ],
    },
    QuestionDescriptor {
        id: "physical_symptoms_intensity",
        prompt: "How intense are your physical symptoms (sweating, rapid heartbeat, trembling)?",
        response_labels: ["None", "Mild", "Moderate", "Severe", "Extreme"],
    },
    QuestionDescriptor {
        id: "interference_with_life",
        prompt: "How much does this fear interfere with your daily life?",
        response_labels: [
            "Not at all",
            "A little",
            "Moderately",
            "Significantly",
            "Completely",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn question_ids_are_unique_per_survey() {
        for kind in [SurveyKind::MentalHealth, SurveyKind::Phobia] {
            let ids: HashSet<_> = kind.questions().iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), kind.question_count());
        }
    }

    #[test]
    fn survey_sizes_match_forms() {
        assert_eq!(SurveyKind::MentalHealth.question_count(), 12);
        assert_eq!(SurveyKind::Phobia.question_count(), 4);
    }

    #[test]
    fn labels_follow_ordinal_scale() {
        let question = &MENTAL_HEALTH_QUESTIONS[1];
        assert_eq!(question.label_for(1), Some("Never"));
        assert_eq!(question.label_for(5), Some("Always"));
        assert_eq!(question.label_for(0), None);
        assert_eq!(question.label_for(6), None);
    }
}
