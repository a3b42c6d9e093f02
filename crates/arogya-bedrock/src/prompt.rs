//! Prompt assembly for intake decisions.
//!
//! The system prompt fixes the reply contract (a single JSON object tagged by
//! `type`); the user message carries the subject, the turn budget and the
//! transcript rendered as a context block.

use arogya_core::models::intake::IntakeKind;

use crate::decision::DecisionRequest;

const TRIAGE_INSTRUCTIONS: &str = "\
You are assisting a community health worker in rural India with a short \
symptom triage. Ask one focused follow-up question at a time about the \
complaint. When you conclude, give a risk level, a likely diagnosis, and \
actionable steps a health worker can follow.";

const NUTRITION_INSTRUCTIONS: &str = "\
You are giving dietary guidance to a family in rural India. Ask one short \
question at a time about meals and appetite. When you conclude, give a \
one-sentence recommendation focused on locally available seasonal food, \
followed by practical tips.";

const QUESTION_SCHEMA: &str = r#"{"type": "question", "text": "<one question>"}"#;

const TRIAGE_SCHEMA: &str = r#"{"type": "triage", "risk_level": "LOW" | "MEDIUM" | "HIGH", "diagnosis": "<text>", "recommendations": ["<step>", ...], "confidence": <0.0 to 1.0>}"#;

const NUTRITION_SCHEMA: &str = r#"{"type": "nutrition", "summary": "<one sentence>", "tips": ["<tip>", ...]}"#;

/// Wrap a rendered transcript in a tagged block.
///
/// Returns an empty string when there is no context to inject.
pub fn build_context_block(transcript_context: &str) -> String {
    if transcript_context.trim().is_empty() {
        return String::new();
    }

    let mut block = String::from("<intake_transcript>\n");
    block.push_str(transcript_context);
    if !transcript_context.ends_with('\n') {
        block.push('\n');
    }
    block.push_str("</intake_transcript>");
    block
}

/// System prompt for one decision call.
pub fn system_prompt(request: &DecisionRequest) -> String {
    let (instructions, terminal_schema) = match request.kind {
        IntakeKind::Nutrition => (NUTRITION_INSTRUCTIONS, NUTRITION_SCHEMA),
        _ => (TRIAGE_INSTRUCTIONS, TRIAGE_SCHEMA),
    };

    let mut prompt = String::from(instructions);
    prompt.push_str("\n\nReply with exactly one JSON object and nothing else.\n");

    if request.is_final_turn() {
        prompt.push_str("This is the final turn: you must conclude now using\n");
        prompt.push_str(terminal_schema);
        prompt.push('\n');
    } else {
        prompt.push_str("Either ask the next question using\n");
        prompt.push_str(QUESTION_SCHEMA);
        prompt.push_str("\nor, if you already have enough information, conclude using\n");
        prompt.push_str(terminal_schema);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Write every human-readable field in {}.",
        request.locale.language_name()
    ));
    prompt
}

/// User message for one decision call.
pub fn user_message(request: &DecisionRequest) -> String {
    let mut message = format!(
        "Subject: {} year old {}.\nTurn {} of {}.\n",
        request.subject_age,
        request.subject_sex.as_str(),
        request.turn_index + 1,
        request.max_turns,
    );

    let block = build_context_block(&request.transcript_context);
    if !block.is_empty() {
        message.push('\n');
        message.push_str(&block);
    }
    message
}
