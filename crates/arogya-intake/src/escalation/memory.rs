use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use arogya_core::models::escalation::{EscalationReceipt, ReviewerResponse};

use super::EscalationInbox;
use crate::error::InboxError;

/// Process-local inbox that pushes reviewer responses to subscribers.
pub struct MemoryInbox {
    receipts: Mutex<HashMap<Uuid, EscalationReceipt>>,
    updates: broadcast::Sender<EscalationReceipt>,
}

impl MemoryInbox {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            receipts: Mutex::new(HashMap::new()),
            updates,
        }
    }

    /// All receipts, oldest first.
    pub fn list(&self) -> Vec<EscalationReceipt> {
        let mut all: Vec<_> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    /// Record a reviewer's answer and notify subscribers.
    pub fn respond(
        &self,
        id: Uuid,
        reviewer: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<EscalationReceipt, InboxError> {
        let updated = {
            let mut receipts = self.lock();
            let receipt = receipts.get_mut(&id).ok_or(InboxError::NotFound(id))?;
            if !receipt.is_pending() {
                return Err(InboxError::AlreadyResponded(id));
            }
            receipt.record_response(ReviewerResponse {
                reviewer: reviewer.into(),
                message: message.into(),
                responded_at: jiff::Timestamp::now(),
            });
            receipt.clone()
        };

        info!(receipt_id = %id, "reviewer responded");
        // No subscribers is fine.
        let _ = self.updates.send(updated.clone());
        Ok(updated)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, EscalationReceipt>> {
        self.receipts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EscalationInbox for MemoryInbox {
    async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError> {
        let mut receipts = self.lock();
        if receipts.contains_key(&receipt.id) {
            return Err(InboxError::Duplicate(receipt.id));
        }
        receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError> {
        Ok(self.lock().get(&id).cloned())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<EscalationReceipt>> {
        Some(self.updates.subscribe())
    }
}
