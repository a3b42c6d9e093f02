use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use arogya_bedrock::decision::{DecisionRequest, ServiceDecision};
use arogya_bedrock::error::BedrockError;
use arogya_core::models::intake::IntakeKind;

use super::{BranchPolicy, Decision, PolicyInput, TerminalOutcome, fallback};

/// External service that generates the next question or the conclusion.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> Result<ServiceDecision, BedrockError>;
}

/// Delegates each turn to a [`DecisionService`], degrading to fixed
/// fallback content on timeout, error, or a reply that does not fit the
/// turn.
pub struct DynamicPolicy {
    service: Arc<dyn DecisionService>,
    timeout: Duration,
}

impl DynamicPolicy {
    pub fn new(service: Arc<dyn DecisionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }
}

pub fn decision_request(input: &PolicyInput) -> DecisionRequest {
    DecisionRequest {
        transcript_context: input.transcript.render_as_context(),
        subject_age: input.subject.age,
        subject_sex: input.subject.sex,
        kind: input.kind,
        turn_index: input.turn_index,
        max_turns: input.max_turns,
        locale: input.locale,
    }
}

/// Map a service reply onto a decision, or `None` if it does not fit.
fn accept(reply: ServiceDecision, input: &PolicyInput) -> Option<Decision> {
    match (reply, input.kind) {
        (ServiceDecision::Question { text }, _)
            if !input.is_final_turn() && !text.trim().is_empty() =>
        {
            Some(Decision::Question(text))
        }
        (ServiceDecision::Triage(result), IntakeKind::Triage) if result.validate().is_ok() => {
            Some(Decision::Terminal(TerminalOutcome::Triage(result)))
        }
        (ServiceDecision::Nutrition(result), IntakeKind::Nutrition)
            if result.validate().is_ok() =>
        {
            Some(Decision::Terminal(TerminalOutcome::Nutrition(result)))
        }
        _ => None,
    }
}

#[async_trait]
impl BranchPolicy for DynamicPolicy {
    async fn next(&self, input: &PolicyInput) -> Decision {
        if input.kind == IntakeKind::Escalation {
            return fallback::decision(input);
        }

        let request = decision_request(input);
        match tokio::time::timeout(self.timeout, self.service.decide(&request)).await {
            Ok(Ok(reply)) => {
                let label = reply.label();
                match accept(reply, input) {
                    Some(decision) => {
                        debug!(turn_index = input.turn_index, reply = label, "decision accepted");
                        decision
                    }
                    None => {
                        warn!(
                            turn_index = input.turn_index,
                            kind = %input.kind,
                            reply = label,
                            "decision does not fit this turn, using fallback"
                        );
                        fallback::decision(input)
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(turn_index = input.turn_index, error = %e, "decision service failed, using fallback");
                fallback::decision(input)
            }
            Err(_) => {
                warn!(
                    turn_index = input.turn_index,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "decision service timed out, using fallback"
                );
                fallback::decision(input)
            }
        }
    }

    fn name(&self) -> &'static str {
        "dynamic"
    }
}
