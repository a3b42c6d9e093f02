use thiserror::Error;
use uuid::Uuid;

use arogya_storage::error::StorageError;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("a capture is already in flight")]
    Busy,

    #[error("operation requires state {expected}, session is {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("no active session")]
    NoSession,
}

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("escalation {0} already exists in the inbox")]
    Duplicate(Uuid),

    #[error("escalation {0} not found")]
    NotFound(Uuid),

    #[error("escalation {0} already has a response")]
    AlreadyResponded(Uuid),

    #[error("no reviewer response for escalation {0} before the deadline")]
    Deadline(Uuid),

    #[error("inbox subscription closed")]
    Closed,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no speech engine available")]
    Unavailable,

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// A static decision tree that cannot drive a bounded dialogue.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("tree has no root node `{0}`")]
    MissingRoot(&'static str),

    #[error("node `{from}` references missing node `{to}`")]
    MissingNode {
        from: &'static str,
        to: &'static str,
    },

    #[error("path through `{node}` asks {depth} questions, more than {max}")]
    TooDeep {
        node: &'static str,
        depth: u32,
        max: u32,
    },
}
