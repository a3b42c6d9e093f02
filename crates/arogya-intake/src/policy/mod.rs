//! Branch policies: given the transcript so far, ask the next question or
//! conclude.
//!
//! Every policy is deterministic in its control decision for a given
//! transcript and turn index, and always concludes on the final turn.

pub mod bedrock;
pub mod dynamic;
pub mod fallback;
pub mod follow_up;
pub mod static_tree;

use std::sync::Arc;

use async_trait::async_trait;

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{NutritionResult, TriageResult};
use arogya_core::models::subject::Subject;
use arogya_core::models::transcript::{MAX_TURNS, Transcript};

use crate::prompts;

/// Everything a policy sees for one decision.
#[derive(Debug, Clone)]
pub struct PolicyInput {
    pub transcript: Transcript,
    /// 0-based index of the turn being decided.
    pub turn_index: u32,
    pub max_turns: u32,
    pub subject: Subject,
    pub kind: IntakeKind,
    pub locale: Locale,
}

impl PolicyInput {
    pub fn new(
        transcript: Transcript,
        turn_index: u32,
        subject: Subject,
        kind: IntakeKind,
        locale: Locale,
    ) -> Self {
        Self {
            transcript,
            turn_index,
            max_turns: MAX_TURNS,
            subject,
            kind,
            locale,
        }
    }

    pub fn is_final_turn(&self) -> bool {
        self.turn_index + 1 >= self.max_turns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalOutcome {
    Triage(TriageResult),
    Nutrition(NutritionResult),
    /// Hand the dialogue to a human reviewer.
    Handoff,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Question(String),
    Terminal(TerminalOutcome),
}

impl Decision {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Decision::Terminal(_))
    }
}

#[async_trait]
pub trait BranchPolicy: Send + Sync {
    /// Decide the next step. Never fails; policies degrade internally.
    async fn next(&self, input: &PolicyInput) -> Decision;

    fn name(&self) -> &'static str;

    /// Prompt spoken when a session of `kind` starts.
    fn opening_prompt(&self, kind: IntakeKind, locale: Locale) -> String {
        prompts::opening_prompt(kind).get(locale).to_string()
    }
}

/// The policy used for each intake kind.
#[derive(Clone)]
pub struct Policies {
    pub triage: Arc<dyn BranchPolicy>,
    pub nutrition: Arc<dyn BranchPolicy>,
    pub escalation: Arc<dyn BranchPolicy>,
}

impl Policies {
    pub fn for_kind(&self, kind: IntakeKind) -> &Arc<dyn BranchPolicy> {
        match kind {
            IntakeKind::Triage => &self.triage,
            IntakeKind::Nutrition => &self.nutrition,
            IntakeKind::Escalation => &self.escalation,
        }
    }
}
