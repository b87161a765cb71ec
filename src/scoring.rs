use crate::models::{ResponseSet, RiskLevel, SeverityCategory};

/// Normalize summed answers onto 0-100.
///
/// Computes `round(100 * sum / (5 * question_count))` with halves rounded up,
/// in integer arithmetic so both survey types round identically. Completeness
/// is the caller's responsibility.
pub fn normalized_score(responses: &ResponseSet, question_count: usize) -> u8 {
    normalize_sum(responses.sum(), question_count)
}

pub fn normalize_sum(sum: u32, question_count: usize) -> u8 {
    if question_count == 0 {
        return 0;
    }
    let n = question_count as u64;
    let scaled = (200 * u64::from(sum) + 5 * n) / (10 * n);
    scaled.min(100) as u8
}

/// Wellness bands, inclusive at the lower edge.
pub fn severity_for(score: u8) -> SeverityCategory {
    match score {
        75..=u8::MAX => SeverityCategory::Stable,
        50..=74 => SeverityCategory::Mild,
        25..=49 => SeverityCategory::Moderate,
        _ => SeverityCategory::Severe,
    }
}

/// Intensity bands. Risk rises with intensity.
pub fn risk_for(intensity: u8) -> RiskLevel {
    match intensity {
        0..=24 => RiskLevel::Low,
        25..=49 => RiskLevel::Medium,
        50..=74 => RiskLevel::High,
        _ => RiskLevel::Severe,
    }
}

pub fn score_mental_health(responses: &ResponseSet, question_count: usize) -> (u8, SeverityCategory) {
    let score = normalized_score(responses, question_count);
    (score, severity_for(score))
}

pub fn score_phobia(responses: &ResponseSet, question_count: usize) -> (u8, RiskLevel) {
    let intensity = normalized_score(responses, question_count);
    (intensity, risk_for(intensity))
}
