use async_trait::async_trait;

use super::{Decision, PolicyInput, TerminalOutcome};
use crate::prompts::{self, Bilingual};

/// Fixed follow-up questions for escalations, ending in a handoff.
pub struct FollowUpPolicy {
    questions: Vec<Bilingual>,
}

impl FollowUpPolicy {
    pub fn new(questions: Vec<Bilingual>) -> Self {
        debug_assert!(!questions.is_empty(), "follow-up policy needs questions");
        Self { questions }
    }
}

impl Default for FollowUpPolicy {
    fn default() -> Self {
        Self::new(prompts::ESCALATION_FOLLOW_UPS.to_vec())
    }
}

#[async_trait]
impl super::BranchPolicy for FollowUpPolicy {
    async fn next(&self, input: &PolicyInput) -> Decision {
        if input.is_final_turn() || self.questions.is_empty() {
            return Decision::Terminal(TerminalOutcome::Handoff);
        }
        let question = &self.questions[input.turn_index as usize % self.questions.len()];
        Decision::Question(question.get(input.locale).to_string())
    }

    fn name(&self) -> &'static str {
        "follow_up"
    }
}
