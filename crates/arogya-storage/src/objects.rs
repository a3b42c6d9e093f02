use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StorageError;

/// Result of a GET operation, including the body and ETag.
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// Conditional-write guard for [`put_object`].
#[derive(Debug, Clone, Copy)]
pub enum WriteCondition<'a> {
    /// Overwrite unconditionally.
    Always,
    /// Only create; fail with `AlreadyExists` if the key is taken.
    IfAbsent,
    /// Only replace the version carrying this ETag (optimistic locking).
    IfMatch(&'a str),
}

/// Get an object from S3.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<GetObjectOutput, StorageError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::GetObject(err.to_string())
            }
        })?;

    let etag = resp.e_tag().map(|s| s.to_string());
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::GetObject(e.to_string()))?
        .into_bytes()
        .to_vec();

    Ok(GetObjectOutput { body, etag })
}

/// Put an object to S3 under the given write condition. Returns the new ETag.
pub async fn put_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: Option<&str>,
    condition: WriteCondition<'_>,
) -> Result<String, StorageError> {
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body));

    if let Some(ct) = content_type {
        req = req.content_type(ct);
    }

    req = match condition {
        WriteCondition::Always => req,
        WriteCondition::IfAbsent => req.if_none_match("*"),
        WriteCondition::IfMatch(etag) => req.if_match(etag),
    };

    let resp = req.send().await.map_err(|e| {
        let err = e.into_service_error();
        let message = err.to_string();
        // S3 answers a failed If-Match / If-None-Match with 412 Precondition
        // Failed, or 409 when a concurrent conditional write wins the race.
        let rejected = message.contains("PreconditionFailed")
            || message.contains("ConditionalRequestConflict");
        match condition {
            WriteCondition::IfAbsent if rejected => StorageError::AlreadyExists {
                key: key.to_string(),
            },
            WriteCondition::IfMatch(_) if rejected => StorageError::PreconditionFailed {
                key: key.to_string(),
            },
            _ => StorageError::PutObject(message),
        }
    })?;

    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// List objects under a prefix. Returns keys.
pub async fn list_objects(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = &continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StorageError::ListObjects(e.into_service_error().to_string()))?;

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                keys.push(key.to_string());
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(|s| s.to_string());
        } else {
            break;
        }
    }

    Ok(keys)
}
