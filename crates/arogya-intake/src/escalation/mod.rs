//! Handing a dialogue to a human reviewer.
//!
//! The [`EscalationDispatcher`] packages the transcript into an
//! [`EscalationReceipt`], publishes it to an append-only
//! [`EscalationInbox`], and lets the caller observe the reviewer's response.

pub mod memory;
pub mod s3;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use arogya_core::models::escalation::{EscalationReceipt, EscalationStatus, SubjectContact};
use arogya_core::models::intake::Locale;
use arogya_core::models::subject::Subject;
use arogya_core::models::transcript::Transcript;

use crate::error::InboxError;

/// Poll interval used when push delivery is requested but unsupported.
const PUSH_FALLBACK_INTERVAL: Duration = Duration::from_secs(5);

/// How reviewer responses are observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseDelivery {
    /// Re-read the receipt every `interval`.
    Poll { interval: Duration },
    /// Subscribe to inbox updates; falls back to polling when the inbox
    /// cannot push.
    Push,
}

/// External queue of receipts awaiting a reviewer.
#[async_trait]
pub trait EscalationInbox: Send + Sync {
    /// Store a new receipt. Fails with `Duplicate` if its id is taken.
    async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError>;

    /// Stream of receipts updated by reviewers, if the inbox can push.
    fn subscribe(&self) -> Option<broadcast::Receiver<EscalationReceipt>> {
        None
    }
}

pub struct EscalationDispatcher {
    inbox: Arc<dyn EscalationInbox>,
    retry_queue: Mutex<Vec<EscalationReceipt>>,
}

impl EscalationDispatcher {
    pub fn new(inbox: Arc<dyn EscalationInbox>) -> Self {
        Self {
            inbox,
            retry_queue: Mutex::new(Vec::new()),
        }
    }

    /// Build a pending receipt from a completed escalation dialogue.
    ///
    /// The first user utterance is the problem description; every later
    /// utterance is a follow-up answer.
    pub fn prepare(
        &self,
        session_id: Uuid,
        subject: &Subject,
        locale: Locale,
        transcript: &Transcript,
    ) -> EscalationReceipt {
        let answers = transcript.completed_user_turns();
        let (problem, follow_ups) = match answers.split_first() {
            Some((first, rest)) => (first.to_string(), rest.iter().map(|s| s.to_string()).collect()),
            None => (String::new(), Vec::new()),
        };

        EscalationReceipt {
            id: Uuid::new_v4(),
            session_id,
            subject_id: subject.id,
            problem_description: problem,
            follow_up_answers: follow_ups,
            subject_contact: SubjectContact {
                name: subject.name.clone(),
                phone: subject.phone.clone(),
                location: subject.location.clone(),
            },
            status: EscalationStatus::Pending,
            locale,
            created_at: jiff::Timestamp::now(),
            response: None,
        }
    }

    /// Publish a prepared receipt. On failure the receipt is queued for
    /// [`EscalationDispatcher::retry_pending`].
    pub async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError> {
        match self.inbox.publish(receipt).await {
            Ok(()) => {
                info!(receipt_id = %receipt.id, "escalation published");
                Ok(())
            }
            Err(e) => {
                warn!(receipt_id = %receipt.id, error = %e, "escalation publish failed, queued for retry");
                self.lock_queue().push(receipt.clone());
                Err(e)
            }
        }
    }

    /// Prepare and publish in one step.
    pub async fn submit(
        &self,
        session_id: Uuid,
        subject: &Subject,
        locale: Locale,
        transcript: &Transcript,
    ) -> EscalationReceipt {
        let receipt = self.prepare(session_id, subject, locale, transcript);
        let _ = self.publish(&receipt).await;
        receipt
    }

    /// Receipts whose publication failed and have not been retried successfully.
    pub fn pending_retries(&self) -> Vec<EscalationReceipt> {
        self.lock_queue().clone()
    }

    /// Publish every queued receipt again. Returns how many left the queue.
    pub async fn retry_pending(&self) -> usize {
        let queued = std::mem::take(&mut *self.lock_queue());
        let mut published = 0;

        for receipt in queued {
            match self.inbox.publish(&receipt).await {
                // A duplicate means an earlier attempt landed after all.
                Ok(()) | Err(InboxError::Duplicate(_)) => {
                    info!(receipt_id = %receipt.id, "queued escalation published");
                    published += 1;
                }
                Err(e) => {
                    warn!(receipt_id = %receipt.id, error = %e, "escalation retry failed");
                    self.lock_queue().push(receipt);
                }
            }
        }
        published
    }

    /// Wait until a reviewer responds to receipt `id`, or `deadline` passes.
    pub async fn await_response(
        &self,
        id: Uuid,
        delivery: &ResponseDelivery,
        deadline: Duration,
    ) -> Result<EscalationReceipt, InboxError> {
        let wait = async {
            match delivery {
                ResponseDelivery::Poll { interval } => self.poll_response(id, *interval).await,
                ResponseDelivery::Push => match self.inbox.subscribe() {
                    Some(updates) => self.push_response(id, updates).await,
                    None => {
                        debug!(receipt_id = %id, "inbox cannot push, polling instead");
                        self.poll_response(id, PUSH_FALLBACK_INTERVAL).await
                    }
                },
            }
        };

        tokio::time::timeout(deadline, wait)
            .await
            .map_err(|_| InboxError::Deadline(id))?
    }

    async fn poll_response(
        &self,
        id: Uuid,
        interval: Duration,
    ) -> Result<EscalationReceipt, InboxError> {
        loop {
            if let Some(receipt) = self.responded(id).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn push_response(
        &self,
        id: Uuid,
        mut updates: broadcast::Receiver<EscalationReceipt>,
    ) -> Result<EscalationReceipt, InboxError> {
        // Subscribed first, so a response landing now is seen either here or
        // on the channel.
        if let Some(receipt) = self.responded(id).await? {
            return Ok(receipt);
        }
        loop {
            match updates.recv().await {
                Ok(receipt) if receipt.id == id && !receipt.is_pending() => return Ok(receipt),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(receipt_id = %id, skipped, "inbox updates lagged, re-reading");
                    if let Some(receipt) = self.responded(id).await? {
                        return Ok(receipt);
                    }
                }
                Err(RecvError::Closed) => return Err(InboxError::Closed),
            }
        }
    }

    /// Re-read receipt `id`, returning it once a reviewer has responded.
    ///
    /// Storage failures are treated as "not yet": the inbox may be briefly
    /// unavailable, and the caller's deadline bounds the wait.
    async fn responded(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError> {
        match self.inbox.fetch(id).await {
            Ok(receipt) => Ok(receipt.filter(|receipt| !receipt.is_pending())),
            Err(InboxError::Storage(e)) => {
                warn!(receipt_id = %id, error = %e, "inbox read failed, will retry");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, Vec<EscalationReceipt>> {
        self.retry_queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}
