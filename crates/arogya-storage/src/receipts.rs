//! Escalation receipts in S3, one JSON object per receipt.
//!
//! Receipts are created once (create-only write) by the intake engine and
//! later updated only by a reviewer, guarded by ETag optimistic locking so a
//! concurrent reviewer write is never silently overwritten.

use aws_sdk_s3::Client;
use tracing::{info, warn};
use uuid::Uuid;

use arogya_core::models::escalation::{EscalationReceipt, ReviewerResponse};
use arogya_core::s3_keys;

use crate::error::StorageError;
use crate::objects::{self, WriteCondition};
use crate::state;

/// Store a new receipt. Fails with `AlreadyExists` if the id is taken.
pub async fn append_receipt(
    client: &Client,
    bucket: &str,
    receipt: &EscalationReceipt,
) -> Result<(), StorageError> {
    let key = s3_keys::escalation(receipt.id);
    state::save_json(client, bucket, &key, receipt, WriteCondition::IfAbsent).await?;
    info!(receipt_id = %receipt.id, key, "escalation receipt stored");
    Ok(())
}

/// Load a receipt by id. Returns `None` if it does not exist (yet).
pub async fn load_receipt(
    client: &Client,
    bucket: &str,
    id: Uuid,
) -> Result<Option<EscalationReceipt>, StorageError> {
    match state::load_json(client, bucket, &s3_keys::escalation(id)).await {
        Ok((receipt, _etag)) => Ok(Some(receipt)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Load every receipt in the inbox, oldest first.
pub async fn list_receipts(
    client: &Client,
    bucket: &str,
) -> Result<Vec<EscalationReceipt>, StorageError> {
    let keys = objects::list_objects(client, bucket, s3_keys::ESCALATIONS_PREFIX).await?;

    let mut receipts = Vec::with_capacity(keys.len());
    for key in keys {
        if s3_keys::escalation_id(&key).is_none() {
            warn!(key, "skipping foreign object in escalation inbox");
            continue;
        }
        let (receipt, _etag): (EscalationReceipt, String) =
            state::load_json(client, bucket, &key).await?;
        receipts.push(receipt);
    }

    receipts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(receipts)
}

/// Attach a reviewer response to a stored receipt.
///
/// Read-modify-write guarded by the ETag observed on read; a concurrent
/// update surfaces as `PreconditionFailed` and the caller may retry.
pub async fn attach_response(
    client: &Client,
    bucket: &str,
    id: Uuid,
    response: ReviewerResponse,
) -> Result<EscalationReceipt, StorageError> {
    let key = s3_keys::escalation(id);
    let (mut receipt, etag): (EscalationReceipt, String) =
        state::load_json(client, bucket, &key).await?;

    receipt.record_response(response);
    state::save_json(client, bucket, &key, &receipt, WriteCondition::IfMatch(&etag)).await?;

    info!(receipt_id = %id, "reviewer response attached");
    Ok(receipt)
}
