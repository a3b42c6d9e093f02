//! Single-utterance speech capture.
//!
//! The [`CaptureAdapter`] wraps a platform [`SpeechRecognizer`] behind a
//! begin/complete contract: each [`CaptureAdapter::begin`] yields exactly one
//! [`SessionEvent::Capture`], at most one capture is in flight, and
//! [`CaptureAdapter::cancel`] aborts the running capture without delivering
//! anything.

pub mod transcribe;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use arogya_core::models::intake::Locale;

use crate::error::IntakeError;
use crate::event::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureErrorKind {
    /// The device has no recognizer.
    Unsupported,
    /// Nothing intelligible was heard.
    NoSpeech,
    /// Network or engine hiccup.
    Transient,
    /// Microphone permission refused.
    DeviceDenied,
}

impl CaptureErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CaptureErrorKind::NoSpeech | CaptureErrorKind::Transient)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Result(String),
    Error(CaptureErrorKind),
    Timeout,
}

/// A recoverable capture problem, surfaced so the caller can re-enable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum CaptureIssue {
    Error(CaptureErrorKind),
    Timeout,
}

/// Identifies one `begin()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(u64);

impl fmt::Display for CaptureTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture-{}", self.0)
    }
}

/// Platform speech-to-text capability.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Probed before every capture.
    fn is_available(&self) -> bool;

    /// Listen for one utterance in `locale`.
    async fn recognize(&self, locale: Locale) -> CaptureOutcome;
}

struct InFlight {
    ticket: CaptureTicket,
    /// `None` when the outcome was delivered without spawning a task.
    task: Option<JoinHandle<()>>,
}

pub struct CaptureAdapter {
    recognizer: Arc<dyn SpeechRecognizer>,
    timeout: Duration,
    next_ticket: u64,
    in_flight: Option<InFlight>,
}

impl CaptureAdapter {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, timeout: Duration) -> Self {
        Self {
            recognizer,
            timeout,
            next_ticket: 0,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start listening for one utterance. The outcome arrives on `events`.
    pub fn begin(
        &mut self,
        epoch: u64,
        locale: Locale,
        events: UnboundedSender<SessionEvent>,
    ) -> Result<CaptureTicket, IntakeError> {
        if self.in_flight.is_some() {
            return Err(IntakeError::Busy);
        }

        self.next_ticket += 1;
        let ticket = CaptureTicket(self.next_ticket);

        if !self.recognizer.is_available() {
            warn!(%ticket, "speech recognizer unavailable");
            let _ = events.send(SessionEvent::Capture {
                epoch,
                ticket,
                outcome: CaptureOutcome::Error(CaptureErrorKind::Unsupported),
            });
            self.in_flight = Some(InFlight { ticket, task: None });
            return Ok(ticket);
        }

        let recognizer = self.recognizer.clone();
        let timeout = self.timeout;
        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, recognizer.recognize(locale)).await {
                Ok(CaptureOutcome::Result(text)) if text.trim().is_empty() => {
                    CaptureOutcome::Error(CaptureErrorKind::NoSpeech)
                }
                Ok(outcome) => outcome,
                Err(_) => CaptureOutcome::Timeout,
            };
            let _ = events.send(SessionEvent::Capture {
                epoch,
                ticket,
                outcome,
            });
        });

        debug!(%ticket, epoch, "capture started");
        self.in_flight = Some(InFlight {
            ticket,
            task: Some(task),
        });
        Ok(ticket)
    }

    /// Mark `ticket` complete. Returns `false` for a ticket that is not the
    /// one in flight, whose outcome must then be dropped.
    pub fn complete(&mut self, ticket: CaptureTicket) -> bool {
        match &self.in_flight {
            Some(current) if current.ticket == ticket => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Abort the capture in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(current) = self.in_flight.take() {
            if let Some(task) = current.task {
                task.abort();
            }
            debug!(ticket = %current.ticket, "capture cancelled");
        }
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.cancel();
    }
}
