use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Which bounded dialogue a session conducts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum IntakeKind {
    /// Symptom triage ending in a risk level and recommendations.
    Triage,
    /// Dietary guidance ending in a summary and tips.
    Nutrition,
    /// Free dialogue handed off to a human reviewer.
    Escalation,
}

impl IntakeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeKind::Triage => "triage",
            IntakeKind::Nutrition => "nutrition",
            IntakeKind::Escalation => "escalation",
        }
    }
}

impl fmt::Display for IntakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-valued language selector threaded through every prompt, decision
/// call and spoken utterance of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Locale {
    /// Regional language (Hindi).
    Local,
    /// English.
    #[default]
    Default,
}

impl Locale {
    /// BCP-47 tag used for speech services.
    pub fn language_tag(&self) -> &'static str {
        match self {
            Locale::Local => "hi-IN",
            Locale::Default => "en-IN",
        }
    }

    /// Language name as it should appear in a model prompt.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::Local => "Hindi",
            Locale::Default => "English",
        }
    }
}
