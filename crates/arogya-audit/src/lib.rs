//! arogya-audit
//!
//! Application-level audit events for intake sessions and escalations.

pub mod events;

pub use events::AuditEvent;
