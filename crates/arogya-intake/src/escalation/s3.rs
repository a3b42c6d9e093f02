use async_trait::async_trait;
use aws_sdk_s3::Client;
use uuid::Uuid;

use arogya_core::models::escalation::{EscalationReceipt, ReviewerResponse};
use arogya_storage::error::StorageError;
use arogya_storage::receipts;

use super::EscalationInbox;
use crate::error::InboxError;

/// Inbox stored as `escalations/{id}.json` objects in an S3 bucket.
///
/// S3 cannot push, so reviewers' responses are observed by polling.
pub struct S3Inbox {
    client: Client,
    bucket: String,
}

impl S3Inbox {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn list(&self) -> Result<Vec<EscalationReceipt>, InboxError> {
        Ok(receipts::list_receipts(&self.client, &self.bucket).await?)
    }

    /// Attach a reviewer's answer to a stored receipt.
    pub async fn respond(
        &self,
        id: Uuid,
        reviewer: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<EscalationReceipt, InboxError> {
        let current = receipts::load_receipt(&self.client, &self.bucket, id)
            .await?
            .ok_or(InboxError::NotFound(id))?;
        if !current.is_pending() {
            return Err(InboxError::AlreadyResponded(id));
        }

        let response = ReviewerResponse {
            reviewer: reviewer.into(),
            message: message.into(),
            responded_at: jiff::Timestamp::now(),
        };
        Ok(receipts::attach_response(&self.client, &self.bucket, id, response).await?)
    }
}

#[async_trait]
impl EscalationInbox for S3Inbox {
    async fn publish(&self, receipt: &EscalationReceipt) -> Result<(), InboxError> {
        match receipts::append_receipt(&self.client, &self.bucket, receipt).await {
            Ok(()) => Ok(()),
            Err(StorageError::AlreadyExists { .. }) => Err(InboxError::Duplicate(receipt.id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<EscalationReceipt>, InboxError> {
        Ok(receipts::load_receipt(&self.client, &self.bucket, id).await?)
    }
}
