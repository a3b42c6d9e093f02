//! Offline content used when the decision service cannot answer.

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{NutritionResult, RiskLevel, TriageResult};

use super::{Decision, PolicyInput, TerminalOutcome};
use crate::prompts::{self, Bilingual};

/// Confidence reported for the generic triage conclusion.
pub const GENERIC_CONFIDENCE: f64 = 0.5;

/// Generic question for a non-final turn, or generic conclusion on the final one.
pub fn decision(input: &PolicyInput) -> Decision {
    if input.is_final_turn() {
        Decision::Terminal(terminal(input.kind, input.locale))
    } else {
        Decision::Question(question(input.kind, input.turn_index, input.locale))
    }
}

pub fn question(kind: IntakeKind, turn_index: u32, locale: Locale) -> String {
    let pool: &[Bilingual] = match kind {
        IntakeKind::Triage => &prompts::TRIAGE_QUESTION_POOL,
        IntakeKind::Nutrition => &prompts::NUTRITION_QUESTION_POOL,
        IntakeKind::Escalation => &prompts::ESCALATION_FOLLOW_UPS,
    };
    pool[turn_index as usize % pool.len()].get(locale).to_string()
}

pub fn terminal(kind: IntakeKind, locale: Locale) -> TerminalOutcome {
    match kind {
        IntakeKind::Triage => TerminalOutcome::Triage(triage_result(locale)),
        IntakeKind::Nutrition => TerminalOutcome::Nutrition(nutrition_result(locale)),
        IntakeKind::Escalation => TerminalOutcome::Handoff,
    }
}

pub fn triage_result(locale: Locale) -> TriageResult {
    TriageResult {
        risk_level: RiskLevel::Medium,
        diagnosis: prompts::GENERIC_DIAGNOSIS.get(locale).to_string(),
        recommendations: texts(&prompts::GENERIC_RECOMMENDATIONS, locale),
        confidence: GENERIC_CONFIDENCE,
    }
}

pub fn nutrition_result(locale: Locale) -> NutritionResult {
    NutritionResult {
        summary: prompts::GENERIC_NUTRITION_SUMMARY.get(locale).to_string(),
        tips: texts(&prompts::SEASONAL_TIPS, locale),
    }
}

fn texts(items: &[Bilingual], locale: Locale) -> Vec<String> {
    items.iter().map(|b| b.get(locale).to_string()).collect()
}
