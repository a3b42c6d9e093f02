use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::escalation::EscalationReceipt;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outcome of a triage dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TriageResult {
    pub risk_level: RiskLevel,
    pub diagnosis: String,
    pub recommendations: Vec<String>,
    /// Model or rule confidence in `[0, 1]`.
    pub confidence: f64,
}

impl TriageResult {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.diagnosis.trim().is_empty() {
            return Err(CoreError::InvalidResult("diagnosis is empty".to_string()));
        }
        if self.recommendations.is_empty() {
            return Err(CoreError::InvalidResult(
                "triage result has no recommendations".to_string(),
            ));
        }
        if self.recommendations.iter().any(|r| r.trim().is_empty()) {
            return Err(CoreError::InvalidResult("blank recommendation".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(CoreError::InvalidResult(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Structured outcome of a nutrition dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NutritionResult {
    /// One-sentence recommendation.
    pub summary: String,
    pub tips: Vec<String>,
}

impl NutritionResult {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.summary.trim().is_empty() {
            return Err(CoreError::InvalidResult("summary is empty".to_string()));
        }
        if self.tips.is_empty() {
            return Err(CoreError::InvalidResult(
                "nutrition result has no tips".to_string(),
            ));
        }
        if self.tips.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidResult("blank nutrition tip".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum FailureReason {
    /// The device cannot capture audio at all.
    CaptureUnsupported,
    /// Microphone permission was refused.
    CaptureDenied,
    /// The subject or intake kind cannot anchor a dialogue.
    Misconfigured,
}

/// A session that ended without a usable outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Failure {
    pub reason: FailureReason,
    /// Shown to the end user, already in the session locale.
    pub message: String,
}

/// Terminal payload of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum SessionResult {
    Triage(TriageResult),
    Nutrition(NutritionResult),
    Escalation(EscalationReceipt),
    Failure(Failure),
}

impl SessionResult {
    pub fn kind_str(&self) -> &'static str {
        match self {
            SessionResult::Triage(_) => "triage",
            SessionResult::Nutrition(_) => "nutrition",
            SessionResult::Escalation(_) => "escalation",
            SessionResult::Failure(_) => "failure",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SessionResult::Failure(_))
    }
}
