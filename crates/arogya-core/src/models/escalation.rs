use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::intake::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EscalationStatus {
    Pending,
    Responded,
}

/// How a reviewer can reach the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubjectContact {
    pub name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReviewerResponse {
    pub reviewer: String,
    pub message: String,
    pub responded_at: jiff::Timestamp,
}

/// A dialogue packaged for a human reviewer.
///
/// Created `Pending` by the intake engine. Only an external reviewer moves
/// it to `Responded`; the engine reads it afterwards but never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EscalationReceipt {
    pub id: Uuid,
    pub session_id: Uuid,
    pub subject_id: Uuid,
    pub problem_description: String,
    pub follow_up_answers: Vec<String>,
    pub subject_contact: SubjectContact,
    pub status: EscalationStatus,
    pub locale: Locale,
    pub created_at: jiff::Timestamp,
    #[serde(default)]
    pub response: Option<ReviewerResponse>,
}

impl EscalationReceipt {
    pub fn is_pending(&self) -> bool {
        self.status == EscalationStatus::Pending
    }

    /// Attach a reviewer's answer. Used by inbox implementations acting on
    /// behalf of the reviewer.
    pub fn record_response(&mut self, response: ReviewerResponse) {
        self.status = EscalationStatus::Responded;
        self.response = Some(response);
    }
}
