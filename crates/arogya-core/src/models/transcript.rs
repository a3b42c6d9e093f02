//! The dialogue transcript: an append-only, strictly alternating log of
//! user utterances and system questions.
//!
//! The opening prompt of a session is spoken but never stored, so the first
//! stored turn is always the user's initial complaint.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Number of user turns a session may take before it must terminate.
pub const MAX_TURNS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TurnRole {
    SystemQuestion,
    UserUtterance,
}

impl TurnRole {
    fn context_label(&self) -> &'static str {
        match self {
            TurnRole::SystemQuestion => "system",
            TurnRole::UserUtterance => "user",
        }
    }

    fn from_context_label(label: &str) -> Option<Self> {
        match label {
            "system" => Some(TurnRole::SystemQuestion),
            "user" => Some(TurnRole::UserUtterance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    /// 1-based turn index at the time the turn was created.
    pub turn_number: u32,
}

impl Turn {
    pub fn utterance(text: impl Into<String>, turn_number: u32) -> Self {
        Self {
            role: TurnRole::UserUtterance,
            text: text.into(),
            turn_number,
        }
    }

    pub fn question(text: impl Into<String>, turn_number: u32) -> Self {
        Self {
            role: TurnRole::SystemQuestion,
            text: text.into(),
            turn_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Out-of-order roles are a caller bug.
    pub fn append(&mut self, turn: Turn) {
        debug_assert!(
            self.accepts(turn.role),
            "{:?} turn breaks alternation after {:?}",
            turn.role,
            self.last_role()
        );
        self.turns.push(turn);
    }

    /// Whether a turn with `role` may be appended next.
    pub fn accepts(&self, role: TurnRole) -> bool {
        match self.last_role() {
            None => role == TurnRole::UserUtterance,
            Some(last) => last != role,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_role(&self) -> Option<TurnRole> {
        self.turns.last().map(|t| t.role)
    }

    /// Ordered text fed to a branch policy as conversation context.
    ///
    /// One line per turn, `user[n]: text` or `system[n]: text`. Line breaks
    /// inside a turn are folded to spaces so the output stays line-oriented.
    pub fn render_as_context(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                format!(
                    "{}[{}]: {}",
                    t.role.context_label(),
                    t.turn_number,
                    fold_line_breaks(&t.text)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rebuild a transcript from the output of [`Transcript::render_as_context`].
    pub fn parse_context(context: &str) -> Result<Self, CoreError> {
        let mut transcript = Transcript::new();

        for (index, line) in context.lines().enumerate() {
            let line_no = index + 1;
            let malformed = |reason: &str| CoreError::MalformedContext {
                line: line_no,
                reason: reason.to_string(),
            };

            let (head, text) = line
                .split_once("]: ")
                .ok_or_else(|| malformed("missing `]: ` separator"))?;
            let (label, number) = head
                .split_once('[')
                .ok_or_else(|| malformed("missing turn number"))?;
            let role = TurnRole::from_context_label(label)
                .ok_or_else(|| malformed("unknown role label"))?;
            let turn_number: u32 = number
                .parse()
                .map_err(|_| malformed("turn number is not an integer"))?;

            if !transcript.accepts(role) {
                return Err(malformed("turns do not alternate"));
            }
            transcript.turns.push(Turn {
                role,
                text: text.to_string(),
                turn_number,
            });
        }

        Ok(transcript)
    }

    /// Text of every user utterance, in order.
    pub fn completed_user_turns(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter(|t| t.role == TurnRole::UserUtterance)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn user_turn_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == TurnRole::UserUtterance)
            .count()
    }

    /// The first user utterance.
    pub fn initial_complaint(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|t| t.role == TurnRole::UserUtterance)
            .map(|t| t.text.as_str())
    }

    pub fn last_user_utterance(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::UserUtterance)
            .map(|t| t.text.as_str())
    }
}

fn fold_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
