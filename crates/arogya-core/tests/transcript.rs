use arogya_core::models::transcript::{Transcript, Turn, TurnRole};

fn sample() -> Transcript {
    let mut transcript = Transcript::new();
    transcript.append(Turn::utterance("fever since two days", 1));
    transcript.append(Turn::question("Does the patient have a cough?", 1));
    transcript.append(Turn::utterance("yes", 2));
    transcript
}

#[test]
fn empty_transcript_renders_empty_context() {
    let transcript = Transcript::new();
    assert_eq!(transcript.render_as_context(), "");
    assert!(Transcript::parse_context("").unwrap().is_empty());
}

#[test]
fn first_turn_must_be_user_utterance() {
    let transcript = Transcript::new();
    assert!(transcript.accepts(TurnRole::UserUtterance));
    assert!(!transcript.accepts(TurnRole::SystemQuestion));
}

#[test]
fn roles_alternate_after_each_append() {
    let transcript = sample();
    assert_eq!(transcript.last_role(), Some(TurnRole::UserUtterance));
    assert!(transcript.accepts(TurnRole::SystemQuestion));
    assert!(!transcript.accepts(TurnRole::UserUtterance));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "breaks alternation")]
fn appending_out_of_order_panics_in_debug_builds() {
    let mut transcript = Transcript::new();
    transcript.append(Turn::question("Where does it hurt?", 1));
}

#[test]
fn render_is_one_line_per_turn() {
    let context = sample().render_as_context();
    assert_eq!(
        context,
        "user[1]: fever since two days\nsystem[1]: Does the patient have a cough?\nuser[2]: yes"
    );
}

#[test]
fn line_breaks_inside_turns_are_folded() {
    let mut transcript = Transcript::new();
    transcript.append(Turn::utterance("pain in\nthe stomach\r\nsince morning", 1));
    assert_eq!(
        transcript.render_as_context(),
        "user[1]: pain in the stomach since morning"
    );
}

#[test]
fn parse_context_inverts_render() {
    let transcript = sample();
    let parsed = Transcript::parse_context(&transcript.render_as_context()).unwrap();
    assert_eq!(parsed, transcript);
}

#[test]
fn parse_context_rejects_unknown_roles() {
    let err = Transcript::parse_context("doctor[1]: hello").unwrap_err();
    assert!(err.to_string().contains("line 1"));
}

#[test]
fn parse_context_rejects_broken_alternation() {
    let err = Transcript::parse_context("user[1]: fever\nuser[2]: cough").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn user_turn_helpers() {
    let transcript = sample();
    assert_eq!(
        transcript.completed_user_turns(),
        vec!["fever since two days", "yes"]
    );
    assert_eq!(transcript.user_turn_count(), 2);
    assert_eq!(transcript.initial_complaint(), Some("fever since two days"));
    assert_eq!(transcript.last_user_utterance(), Some("yes"));
}
