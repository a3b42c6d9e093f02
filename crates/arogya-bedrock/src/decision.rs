use aws_sdk_bedrockruntime::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{NutritionResult, TriageResult};
use arogya_core::models::subject::Sex;

use crate::chat::{self, InferenceSettings};
use crate::error::BedrockError;
use crate::prompt;

/// Everything the decision service sees for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Output of `Transcript::render_as_context`.
    pub transcript_context: String,
    pub subject_age: u32,
    pub subject_sex: Sex,
    pub kind: IntakeKind,
    /// 0-based index of the turn being decided.
    pub turn_index: u32,
    pub max_turns: u32,
    pub locale: Locale,
}

impl DecisionRequest {
    pub fn is_final_turn(&self) -> bool {
        self.turn_index + 1 >= self.max_turns
    }
}

/// What the model decided: keep asking, or conclude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceDecision {
    Question { text: String },
    Triage(TriageResult),
    Nutrition(NutritionResult),
}

impl ServiceDecision {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceDecision::Question { .. } => "question",
            ServiceDecision::Triage(_) => "triage",
            ServiceDecision::Nutrition(_) => "nutrition",
        }
    }
}

/// Ask Bedrock for the next question or the terminal result.
///
/// Each call gets a transaction id that appears on both of its log lines.
pub async fn decide(
    client: &Client,
    model_id: &str,
    request: &DecisionRequest,
) -> Result<ServiceDecision, BedrockError> {
    if request.kind == IntakeKind::Escalation {
        return Err(BedrockError::UnsupportedKind(request.kind.to_string()));
    }

    let transaction_id = Uuid::new_v4();
    info!(
        transaction_id = %transaction_id,
        model = model_id,
        kind = %request.kind,
        turn_index = request.turn_index,
        "requesting intake decision"
    );

    let system_prompt = prompt::system_prompt(request);
    let user_message = prompt::user_message(request);
    let response_text = chat::converse(
        client,
        model_id,
        &system_prompt,
        &user_message,
        InferenceSettings::default(),
    )
    .await?;

    let decision = parse_decision(&response_text, request)?;

    info!(
        transaction_id = %transaction_id,
        decision = decision.label(),
        "intake decision received"
    );

    Ok(decision)
}

/// Parse and validate a model reply against the request it answers.
///
/// Rejects replies of the wrong shape for the intake kind, questions on the
/// final turn, and terminal results that fail domain validation.
pub fn parse_decision(
    response_text: &str,
    request: &DecisionRequest,
) -> Result<ServiceDecision, BedrockError> {
    let json = strip_code_fence(response_text);
    let schema_violation = |e: serde_json::Error| {
        BedrockError::SchemaViolation(format!(
            "failed to parse decision: {e}. Response: {response_text}"
        ))
    };

    let mut value: serde_json::Value = serde_json::from_str(json).map_err(schema_violation)?;
    // Models answer "high" as often as "HIGH".
    if let Some(risk) = value.get_mut("risk_level") {
        if let Some(level) = risk.as_str().map(str::to_uppercase) {
            *risk = serde_json::Value::String(level);
        }
    }
    let decision: ServiceDecision = serde_json::from_value(value).map_err(schema_violation)?;

    match (&decision, request.kind) {
        (ServiceDecision::Question { text }, _) => {
            if text.trim().is_empty() {
                return Err(BedrockError::SchemaViolation(
                    "question text is empty".to_string(),
                ));
            }
            if request.is_final_turn() {
                return Err(BedrockError::SchemaViolation(format!(
                    "question returned on final turn {}",
                    request.turn_index
                )));
            }
        }
        (ServiceDecision::Triage(result), IntakeKind::Triage) => {
            result
                .validate()
                .map_err(|e| BedrockError::SchemaViolation(e.to_string()))?;
        }
        (ServiceDecision::Nutrition(result), IntakeKind::Nutrition) => {
            result
                .validate()
                .map_err(|e| BedrockError::SchemaViolation(e.to_string()))?;
        }
        (other, kind) => {
            return Err(BedrockError::SchemaViolation(format!(
                "{} result returned for {kind} intake",
                other.label()
            )));
        }
    }

    Ok(decision)
}

/// Strip a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
