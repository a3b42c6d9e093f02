use arogya_bedrock::decision::{DecisionRequest, ServiceDecision, parse_decision};
use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::RiskLevel;
use arogya_core::models::subject::Sex;

fn request(kind: IntakeKind, turn_index: u32) -> DecisionRequest {
    DecisionRequest {
        transcript_context: "user[1]: fever and cough".to_string(),
        subject_age: 28,
        subject_sex: Sex::Female,
        kind,
        turn_index,
        max_turns: 3,
        locale: Locale::Default,
    }
}

#[test]
fn parses_question_before_final_turn() {
    let decision = parse_decision(
        r#"{"type": "question", "text": "Since how many days?"}"#,
        &request(IntakeKind::Triage, 0),
    )
    .unwrap();
    assert_eq!(
        decision,
        ServiceDecision::Question {
            text: "Since how many days?".to_string()
        }
    );
}

#[test]
fn rejects_question_on_final_turn() {
    let err = parse_decision(
        r#"{"type": "question", "text": "Anything else?"}"#,
        &request(IntakeKind::Triage, 2),
    )
    .unwrap_err();
    assert!(err.to_string().contains("final turn"));
}

#[test]
fn parses_triage_result_inside_code_fence() {
    let reply = "```json\n{\"type\": \"triage\", \"risk_level\": \"high\", \"diagnosis\": \"Pneumonia\", \"recommendations\": [\"Refer to PHC today\"], \"confidence\": 0.8}\n```";
    let decision = parse_decision(reply, &request(IntakeKind::Triage, 2)).unwrap();
    match decision {
        ServiceDecision::Triage(result) => {
            assert_eq!(result.risk_level, RiskLevel::High);
            assert_eq!(result.recommendations, vec!["Refer to PHC today"]);
        }
        other => panic!("expected triage, got {other:?}"),
    }
}

#[test]
fn risk_level_casing_is_normalized() {
    for level in ["low", "Low", "LOW"] {
        let reply = format!(
            r#"{{"type": "triage", "risk_level": "{level}", "diagnosis": "Cold", "recommendations": ["Rest"], "confidence": 0.6}}"#
        );
        match parse_decision(&reply, &request(IntakeKind::Triage, 2)).unwrap() {
            ServiceDecision::Triage(result) => assert_eq!(result.risk_level, RiskLevel::Low),
            other => panic!("expected triage, got {other:?}"),
        }
    }
}

#[test]
fn rejects_blank_recommendation() {
    let reply = r#"{"type": "triage", "risk_level": "LOW", "diagnosis": "Cold", "recommendations": ["", "Rest"], "confidence": 0.4}"#;
    assert!(parse_decision(reply, &request(IntakeKind::Triage, 2)).is_err());
}

#[test]
fn rejects_result_for_wrong_kind() {
    let reply = r#"{"type": "nutrition", "summary": "Eat greens.", "tips": ["Add spinach"]}"#;
    let err = parse_decision(reply, &request(IntakeKind::Triage, 2)).unwrap_err();
    assert!(err.to_string().contains("nutrition result returned for triage"));
}

#[test]
fn rejects_triage_without_recommendations() {
    let reply = r#"{"type": "triage", "risk_level": "LOW", "diagnosis": "Cold", "recommendations": [], "confidence": 0.4}"#;
    assert!(parse_decision(reply, &request(IntakeKind::Triage, 1)).is_err());
}

#[test]
fn rejects_out_of_range_confidence() {
    let reply = r#"{"type": "triage", "risk_level": "LOW", "diagnosis": "Cold", "recommendations": ["Rest"], "confidence": 7}"#;
    assert!(parse_decision(reply, &request(IntakeKind::Triage, 1)).is_err());
}

#[test]
fn rejects_prose_replies() {
    let err = parse_decision(
        "I think the patient should rest.",
        &request(IntakeKind::Nutrition, 0),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to parse decision"));
}

#[test]
fn nutrition_result_accepted_early() {
    let reply = r#"{"type": "nutrition", "summary": "Eat seasonal fruit daily.", "tips": ["Guava in winter"]}"#;
    let decision = parse_decision(reply, &request(IntakeKind::Nutrition, 1)).unwrap();
    assert_eq!(decision.label(), "nutrition");
}
