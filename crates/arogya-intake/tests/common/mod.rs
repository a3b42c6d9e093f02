//! Test doubles for the engine's collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use arogya_bedrock::decision::{DecisionRequest, ServiceDecision};
use arogya_bedrock::error::BedrockError;
use arogya_core::models::escalation::EscalationReceipt;
use arogya_storage::error::StorageError;
use arogya_core::models::intake::Locale;
use arogya_core::models::subject::{Sex, Subject};
use arogya_core::models::transcript::{Transcript, Turn};
use arogya_intake::capture::{CaptureOutcome, SpeechRecognizer};
use arogya_intake::error::{FeedbackError, InboxError};
use arogya_intake::escalation::memory::MemoryInbox;
use arogya_intake::escalation::{EscalationDispatcher, EscalationInbox, ResponseDelivery};
use arogya_intake::feedback::{FeedbackEmitter, SpeechSynthesizer};
use arogya_intake::policy::dynamic::{DecisionService, DynamicPolicy};
use arogya_intake::policy::follow_up::FollowUpPolicy;
use arogya_intake::policy::static_tree::StaticTriagePolicy;
use arogya_intake::policy::Policies;
use arogya_intake::{EngineSettings, SessionController, SessionState};

// --- capture ---

/// Replays a fixed list of outcomes, then listens forever.
pub struct ScriptedRecognizer {
    available: AtomicBool,
    script: Mutex<VecDeque<CaptureOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(outcomes: impl IntoIterator<Item = CaptureOutcome>) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(true),
            script: Mutex::new(outcomes.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn answers(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| CaptureOutcome::Result(t.to_string())))
    }

    /// Never hears anything.
    pub fn silent() -> Arc<Self> {
        Self::new([])
    }

    pub fn unavailable() -> Arc<Self> {
        let recognizer = Self::silent();
        recognizer.available.store(false, Ordering::SeqCst);
        recognizer
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn recognize(&self, _locale: Locale) -> CaptureOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}

// --- feedback ---

/// Records `start:<text>` when playback begins and `end:<text>` when it
/// runs to completion.
pub struct RecordingSynthesizer {
    available: bool,
    fail: bool,
    playback: Duration,
    log: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    pub fn new(playback: Duration) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            fail: false,
            playback,
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            fail: false,
            playback: Duration::ZERO,
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            fail: true,
            playback: Duration::ZERO,
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn speak(&self, text: &str, _locale: Locale) -> Result<(), FeedbackError> {
        self.log.lock().unwrap().push(format!("start:{text}"));
        if self.fail {
            return Err(FeedbackError::Synthesis("engine crashed".to_string()));
        }
        tokio::time::sleep(self.playback).await;
        self.log.lock().unwrap().push(format!("end:{text}"));
        Ok(())
    }
}

// --- decision service ---

/// Replays scripted replies; once exhausted every call fails.
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<ServiceDecision, BedrockError>>>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedService {
    pub fn new(
        replies: impl IntoIterator<Item = Result<ServiceDecision, BedrockError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn offline() -> Arc<Self> {
        Self::new([])
    }

    pub fn requests(&self) -> Vec<DecisionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionService for ScriptedService {
    async fn decide(&self, request: &DecisionRequest) -> Result<ServiceDecision, BedrockError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(BedrockError::Invocation("service offline".to_string())))
    }
}

/// Answers only after `delay`, which tests set beyond the decision timeout.
pub struct SlowService {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowService {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionService for SlowService {
    async fn decide(&self, _request: &DecisionRequest) -> Result<ServiceDecision, BedrockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(ServiceDecision::Question {
            text: "too late".to_string(),
        })
    }
}

// --- inbox ---

/// Memory inbox whose first `failures` publications fail.
pub struct FlakyInbox {
    pub inner: MemoryInbox,
    failures: AtomicUsize,
}

impl FlakyInbox {
    pub fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryInbox::new(),
            failures: AtomicUsize::new(failures),
        })
    }
}

#[async_trait]
impl EscalationInbox for FlakyInbox {
    async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(InboxError::Closed);
        }
        self.inner.publish(receipt).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError> {
        self.inner.fetch(id).await
    }
}

/// Memory inbox whose `nth` read (1-based) fails with a storage error.
pub struct UnsteadyInbox {
    pub inner: MemoryInbox,
    failing_read: usize,
    reads: AtomicUsize,
}

impl UnsteadyInbox {
    pub fn new(failing_read: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryInbox::new(),
            failing_read,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EscalationInbox for UnsteadyInbox {
    async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError> {
        self.inner.publish(receipt).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if read == self.failing_read {
            return Err(InboxError::Storage(StorageError::GetObject(
                "503 SlowDown".to_string(),
            )));
        }
        self.inner.fetch(id).await
    }
}

// --- fixtures ---

pub fn settings() -> EngineSettings {
    EngineSettings {
        decision_timeout: Duration::from_millis(100),
        capture_timeout: Duration::from_secs(5),
        response_delivery: ResponseDelivery::Push,
        model_id: "test-model".to_string(),
    }
}

pub fn subject() -> Subject {
    Subject::new("Asha Devi", 28, Sex::Female)
        .with_phone("+91 98765 43210")
        .with_location("Sitapur")
}

/// Alternating transcript: each answer followed by a question, except the last.
pub fn transcript(answers: &[&str]) -> Transcript {
    let mut transcript = Transcript::new();
    for (i, answer) in answers.iter().enumerate() {
        let n = i as u32 + 1;
        transcript.append(Turn::utterance(*answer, n));
        if i + 1 < answers.len() {
            transcript.append(Turn::question(format!("question {n}"), n));
        }
    }
    transcript
}

pub struct Harness {
    pub controller: SessionController,
    pub synthesizer: Arc<RecordingSynthesizer>,
    pub dispatcher: Arc<EscalationDispatcher>,
}

pub fn harness(
    recognizer: Arc<dyn SpeechRecognizer>,
    service: Arc<dyn DecisionService>,
    inbox: Arc<dyn EscalationInbox>,
) -> Harness {
    let settings = settings();
    let synthesizer = RecordingSynthesizer::new(Duration::ZERO);
    let feedback = FeedbackEmitter::new(synthesizer.clone());
    let dispatcher = Arc::new(EscalationDispatcher::new(inbox));
    let policies = Policies {
        triage: Arc::new(StaticTriagePolicy::standard()),
        nutrition: Arc::new(DynamicPolicy::new(service, settings.decision_timeout)),
        escalation: Arc::new(FollowUpPolicy::default()),
    };
    let controller = SessionController::new(
        settings,
        recognizer,
        feedback,
        policies,
        dispatcher.clone(),
    );
    Harness {
        controller,
        synthesizer,
        dispatcher,
    }
}

/// Keep capturing until the session finishes, then let background work drain.
pub async fn run_to_finish(controller: &mut SessionController) {
    for _ in 0..50 {
        match controller.state() {
            SessionState::AwaitingInput => {
                if !controller.capture_in_flight() {
                    controller.begin_capture().unwrap();
                }
            }
            SessionState::Processing => {}
            SessionState::Finished | SessionState::Selecting => break,
        }
        if !controller.pump().await {
            break;
        }
    }
    controller.settle().await;
}
