use uuid::Uuid;

use crate::capture::{CaptureOutcome, CaptureTicket};
use crate::policy::Decision;

/// Completion of an asynchronous call, delivered back to the controller.
///
/// Capture and policy completions carry the controller epoch they were
/// started under; the controller drops any whose epoch is no longer current.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Capture {
        epoch: u64,
        ticket: CaptureTicket,
        outcome: CaptureOutcome,
    },
    Policy {
        epoch: u64,
        decision: Decision,
    },
    /// Background publication of an escalation receipt finished.
    Published {
        receipt_id: Uuid,
        result: Result<(), String>,
    },
}
