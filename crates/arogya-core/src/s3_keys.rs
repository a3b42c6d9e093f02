//! S3 key/path conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of objects in the Arogya S3 bucket.

use uuid::Uuid;

pub const ESCALATIONS_PREFIX: &str = "escalations/";

pub fn escalation(id: Uuid) -> String {
    format!("escalations/{id}.json")
}

/// Parse the receipt id back out of an escalation key.
pub fn escalation_id(key: &str) -> Option<Uuid> {
    key.strip_prefix(ESCALATIONS_PREFIX)
        .and_then(|rest| rest.strip_suffix(".json"))
        .and_then(|id| Uuid::parse_str(id).ok())
}

pub fn audio_clip(session_id: Uuid, clip_id: Uuid, extension: &str) -> String {
    format!("audio/{session_id}/{clip_id}.{extension}")
}

pub const TRANSCRIBE_OUTPUT_PREFIX: &str = "_transcribe/";
