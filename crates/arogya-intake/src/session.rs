use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::SessionResult;
use arogya_core::models::subject::Subject;
use arogya_core::models::transcript::{MAX_TURNS, Transcript, Turn};

use crate::capture::CaptureIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No session; the caller is choosing a subject and intake kind.
    Selecting,
    AwaitingInput,
    Processing,
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Selecting => "SELECTING",
            SessionState::AwaitingInput => "AWAITING_INPUT",
            SessionState::Processing => "PROCESSING",
            SessionState::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded dialogue. Only the controller mutates it.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub subject: Subject,
    pub kind: IntakeKind,
    pub locale: Locale,
    /// Controller generation this session belongs to.
    pub epoch: u64,
    pub state: SessionState,
    /// Completed turns, `0..=MAX_TURNS`.
    pub turn_index: u32,
    pub transcript: Transcript,
    /// Set exactly when `state` is `Finished`.
    pub result: Option<SessionResult>,
    /// Most recent recoverable capture problem, cleared by the next utterance.
    pub last_capture_issue: Option<CaptureIssue>,
    pub created_at: jiff::Timestamp,
}

impl Session {
    pub(crate) fn new(subject: Subject, kind: IntakeKind, locale: Locale, epoch: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject,
            kind,
            locale,
            epoch,
            state: SessionState::AwaitingInput,
            turn_index: 0,
            transcript: Transcript::new(),
            result: None,
            last_capture_issue: None,
            created_at: jiff::Timestamp::now(),
        }
    }

    pub fn max_turns(&self) -> u32 {
        MAX_TURNS
    }

    /// Whether the turn currently being decided is the last one allowed.
    pub fn is_final_turn(&self) -> bool {
        self.turn_index + 1 >= MAX_TURNS
    }

    pub(crate) fn record_utterance(&mut self, text: String) {
        self.transcript
            .append(Turn::utterance(text, self.turn_index + 1));
        self.last_capture_issue = None;
        self.state = SessionState::Processing;
    }

    pub(crate) fn record_question(&mut self, text: String) {
        self.transcript.append(Turn::question(text, self.turn_index + 1));
        self.turn_index += 1;
        self.state = SessionState::AwaitingInput;
    }

    pub(crate) fn finish(&mut self, result: SessionResult) {
        debug_assert!(self.turn_index <= MAX_TURNS);
        self.result = Some(result);
        self.state = SessionState::Finished;
    }
}
