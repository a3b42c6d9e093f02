//! The session controller: one event-driven state machine per process.
//!
//! ```text
//! SELECTING --start--> AWAITING_INPUT --utterance--> PROCESSING
//!                           ^   |                        |
//!                           |   +--retryable issue--+    +--question--> AWAITING_INPUT
//!                           +-----------------------+    +--terminal--> FINISHED --reset--> SELECTING
//! any state --cancel--> SELECTING
//! ```
//!
//! Capture and policy calls run as spawned tasks and report back through an
//! internal channel as [`SessionEvent`]s. Each is tagged with the epoch it
//! was started under; [`SessionController::cancel`] and
//! [`SessionController::start`] move to a new epoch so late completions
//! from a discarded session are dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use arogya_audit::AuditEvent;
use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{Failure, FailureReason, SessionResult};
use arogya_core::models::subject::Subject;

use crate::capture::{
    CaptureAdapter, CaptureErrorKind, CaptureIssue, CaptureOutcome, CaptureTicket,
    SpeechRecognizer,
};
use crate::error::IntakeError;
use crate::escalation::EscalationDispatcher;
use crate::event::SessionEvent;
use crate::feedback::FeedbackEmitter;
use crate::policy::{Decision, Policies, PolicyInput, TerminalOutcome, fallback};
use crate::prompts;
use crate::session::{Session, SessionState};
use crate::settings::EngineSettings;

pub struct SessionController {
    settings: EngineSettings,
    policies: Policies,
    capture: CaptureAdapter,
    feedback: Arc<FeedbackEmitter>,
    dispatcher: Arc<EscalationDispatcher>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    epoch: u64,
    session: Option<Session>,
    policy_task: Option<JoinHandle<()>>,
    /// Escalation publications still running. Not tied to an epoch.
    publications: usize,
}

impl SessionController {
    pub fn new(
        settings: EngineSettings,
        recognizer: Arc<dyn SpeechRecognizer>,
        feedback: Arc<FeedbackEmitter>,
        policies: Policies,
        dispatcher: Arc<EscalationDispatcher>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            capture: CaptureAdapter::new(recognizer, settings.capture_timeout),
            settings,
            policies,
            feedback,
            dispatcher,
            events_tx,
            events_rx,
            epoch: 0,
            session: None,
            policy_task: None,
            publications: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Selecting, |s| s.state)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Arc<EscalationDispatcher> {
        &self.dispatcher
    }

    pub fn capture_in_flight(&self) -> bool {
        self.capture.is_busy()
    }

    pub fn policy_in_flight(&self) -> bool {
        self.policy_task.is_some()
    }

    pub fn pending_publications(&self) -> usize {
        self.publications
    }

    /// Start a session for `subject`, discarding any existing one.
    /// Returns the new session's id.
    ///
    /// A subject that fails validation finishes the new session at once
    /// with a `MISCONFIGURED` failure.
    pub fn start(&mut self, subject: Subject, kind: IntakeKind, locale: Locale) -> Uuid {
        if self.session.is_some() {
            self.discard("session.replaced");
        }
        self.epoch += 1;

        let session = Session::new(subject, kind, locale, self.epoch);
        let session_id = session.id;
        info!(
            %session_id,
            kind = %kind,
            locale = locale.language_tag(),
            epoch = self.epoch,
            "session started"
        );
        AuditEvent::session("session.started", session_id)
            .with_details(serde_json::json!({
                "kind": kind.as_str(),
                "locale": locale.language_tag(),
                "subject_id": session.subject.id,
            }))
            .emit();

        let validation = session.subject.validate();
        self.session = Some(session);

        match validation {
            Ok(()) => {
                let opening = self.policies.for_kind(kind).opening_prompt(kind, locale);
                self.feedback.speak(opening, locale);
            }
            Err(e) => {
                warn!(%session_id, error = %e, "subject misconfigured");
                self.fail(FailureReason::Misconfigured);
            }
        }
        session_id
    }

    /// Listen for the next utterance.
    pub fn begin_capture(&mut self) -> Result<CaptureTicket, IntakeError> {
        let session = self.session.as_ref().ok_or(IntakeError::NoSession)?;
        if session.state != SessionState::AwaitingInput {
            return Err(IntakeError::InvalidState {
                expected: SessionState::AwaitingInput,
                actual: session.state,
            });
        }
        let locale = session.locale;
        self.capture
            .begin(self.epoch, locale, self.events_tx.clone())
    }

    /// Accept a fixed-choice answer in place of speech, cancelling any
    /// capture in flight.
    pub fn answer(&mut self, text: impl Into<String>) -> Result<(), IntakeError> {
        let session = self.session.as_ref().ok_or(IntakeError::NoSession)?;
        if session.state != SessionState::AwaitingInput {
            return Err(IntakeError::InvalidState {
                expected: SessionState::AwaitingInput,
                actual: session.state,
            });
        }
        self.capture.cancel();
        self.accept_utterance(text.into());
        Ok(())
    }

    /// Abandon the session from any state. Late completions are ignored.
    pub fn cancel(&mut self) {
        self.feedback.stop();
        if self.session.is_some() {
            self.discard("session.cancelled");
        } else {
            self.capture.cancel();
            self.abort_policy();
            self.epoch += 1;
        }
    }

    /// Leave a finished session.
    pub fn reset(&mut self) -> Result<(), IntakeError> {
        let state = self.state();
        if state != SessionState::Finished {
            return Err(IntakeError::InvalidState {
                expected: SessionState::Finished,
                actual: state,
            });
        }
        self.session = None;
        self.epoch += 1;
        Ok(())
    }

    /// Wait for the next completion and apply it. Returns `false` when
    /// nothing is outstanding.
    pub async fn pump(&mut self) -> bool {
        if !self.has_outstanding() && self.events_rx.is_empty() {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Pump until no capture, policy call, or publication is outstanding.
    pub async fn settle(&mut self) {
        while self.pump().await {}
    }

    /// Apply one completion.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Capture {
                epoch,
                ticket,
                outcome,
            } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, %ticket, "dropping stale capture");
                    return;
                }
                if !self.capture.complete(ticket) {
                    debug!(%ticket, "dropping capture that is no longer in flight");
                    return;
                }
                self.on_capture(outcome);
            }
            SessionEvent::Policy { epoch, decision } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "dropping stale decision");
                    return;
                }
                self.policy_task = None;
                self.on_decision(decision);
            }
            SessionEvent::Published { receipt_id, result } => {
                self.publications = self.publications.saturating_sub(1);
                match result {
                    Ok(()) => debug!(%receipt_id, "escalation publication confirmed"),
                    Err(error) => warn!(%receipt_id, error = %error, "escalation publication failed"),
                }
            }
        }
    }

    fn has_outstanding(&self) -> bool {
        self.capture.is_busy() || self.policy_task.is_some() || self.publications > 0
    }

    fn on_capture(&mut self, outcome: CaptureOutcome) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != SessionState::AwaitingInput {
            return;
        }

        let issue = match outcome {
            CaptureOutcome::Result(text) if !text.trim().is_empty() => {
                self.accept_utterance(text);
                return;
            }
            CaptureOutcome::Result(_) => CaptureIssue::Error(CaptureErrorKind::NoSpeech),
            CaptureOutcome::Timeout => CaptureIssue::Timeout,
            CaptureOutcome::Error(kind) if kind.is_retryable() => CaptureIssue::Error(kind),
            CaptureOutcome::Error(CaptureErrorKind::DeviceDenied) => {
                self.fail(FailureReason::CaptureDenied);
                return;
            }
            CaptureOutcome::Error(_) => {
                self.fail(FailureReason::CaptureUnsupported);
                return;
            }
        };

        debug!(session_id = %session.id, ?issue, "retryable capture issue");
        session.last_capture_issue = Some(issue);
        let locale = session.locale;
        self.feedback
            .speak(prompts::RETRY_CAPTURE.get(locale), locale);
    }

    fn accept_utterance(&mut self, text: String) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.record_utterance(text);

        if session.kind == IntakeKind::Escalation && session.is_final_turn() {
            session.turn_index += 1;
            self.finish_escalation();
        } else {
            self.spawn_policy();
        }
    }

    fn spawn_policy(&mut self) {
        debug_assert!(self.policy_task.is_none(), "policy call already in flight");
        self.abort_policy();
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let input = PolicyInput::new(
            session.transcript.clone(),
            session.turn_index,
            session.subject.clone(),
            session.kind,
            session.locale,
        );
        let policy = self.policies.for_kind(session.kind).clone();
        let events = self.events_tx.clone();
        let epoch = self.epoch;

        debug!(
            session_id = %session.id,
            policy = policy.name(),
            turn_index = session.turn_index,
            "requesting decision"
        );
        self.policy_task = Some(tokio::spawn(async move {
            let decision = policy.next(&input).await;
            let _ = events.send(SessionEvent::Policy { epoch, decision });
        }));
    }

    fn on_decision(&mut self, decision: Decision) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != SessionState::Processing {
            return;
        }

        let outcome = match decision {
            Decision::Question(text) if !session.is_final_turn() => {
                session.record_question(text.clone());
                debug!(session_id = %session.id, turn_index = session.turn_index, "next question");
                self.feedback.speak(text, session.locale);
                return;
            }
            Decision::Question(_) => {
                debug_assert!(false, "policy asked a question on the final turn");
                fallback::terminal(session.kind, session.locale)
            }
            Decision::Terminal(outcome) => outcome,
        };

        session.turn_index += 1;
        let result = match (outcome, session.kind) {
            (TerminalOutcome::Triage(r), IntakeKind::Triage) => SessionResult::Triage(r),
            (TerminalOutcome::Nutrition(r), IntakeKind::Nutrition) => SessionResult::Nutrition(r),
            (TerminalOutcome::Handoff, IntakeKind::Escalation) => {
                self.finish_escalation();
                return;
            }
            (_, IntakeKind::Triage) => SessionResult::Triage(fallback::triage_result(session.locale)),
            (_, IntakeKind::Nutrition) => {
                SessionResult::Nutrition(fallback::nutrition_result(session.locale))
            }
            (_, IntakeKind::Escalation) => {
                self.finish_escalation();
                return;
            }
        };
        self.finish(result);
    }

    /// Package the dialogue for a reviewer and finish with the receipt.
    /// Publication continues in the background.
    fn finish_escalation(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let receipt = self.dispatcher.prepare(
            session.id,
            &session.subject,
            session.locale,
            &session.transcript,
        );
        AuditEvent::escalation("escalation.submitted", receipt.id, arogya_audit::events::ENGINE_ACTOR)
            .with_details(serde_json::json!({
                "session_id": session.id,
                "follow_up_answers": receipt.follow_up_answers.len(),
            }))
            .emit();

        let dispatcher = self.dispatcher.clone();
        let events = self.events_tx.clone();
        let published = receipt.clone();
        self.publications += 1;
        tokio::spawn(async move {
            let result = dispatcher
                .publish(&published)
                .await
                .map_err(|e| e.to_string());
            let _ = events.send(SessionEvent::Published {
                receipt_id: published.id,
                result,
            });
        });

        self.finish(SessionResult::Escalation(receipt));
    }

    fn fail(&mut self, reason: FailureReason) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let message = prompts::failure_message(reason).get(session.locale).to_string();
        self.finish(SessionResult::Failure(Failure { reason, message }));
    }

    fn finish(&mut self, result: SessionResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let summary = prompts::summary(&result, session.locale);
        info!(
            session_id = %session.id,
            result = result.kind_str(),
            turn_index = session.turn_index,
            "session finished"
        );
        AuditEvent::session("session.finished", session.id)
            .with_details(serde_json::json!({
                "result": result.kind_str(),
                "turns": session.turn_index,
            }))
            .emit();

        session.finish(result);
        self.feedback.speak(summary, session.locale);
    }

    fn discard(&mut self, action: &'static str) {
        self.capture.cancel();
        self.abort_policy();
        self.epoch += 1;
        if let Some(session) = self.session.take() {
            info!(session_id = %session.id, state = %session.state, action, "session discarded");
            AuditEvent::session(action, session.id)
                .with_details(serde_json::json!({ "state": session.state.as_str() }))
                .emit();
        }
    }

    fn abort_policy(&mut self) {
        if let Some(task) = self.policy_task.take() {
            task.abort();
        }
    }
}
