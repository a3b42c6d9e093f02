use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Actor recorded when the intake engine acts on its own behalf.
pub const ENGINE_ACTOR: &str = "intake-engine";

/// A structured audit event for session lifecycle and reviewer actions.
///
/// Events are logged via `tracing` under the `audit.*` fields so they can be
/// filtered out of the regular log stream (e.g. with the JSON formatter).
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub actor: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            actor: actor.into(),
            details: None,
        }
    }

    /// An event about an intake session, performed by the engine.
    pub fn session(action: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(action, "session", session_id.to_string(), ENGINE_ACTOR)
    }

    /// An event about an escalation receipt.
    pub fn escalation(action: impl Into<String>, receipt_id: Uuid, actor: impl Into<String>) -> Self {
        Self::new(action, "escalation", receipt_id.to_string(), actor)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.resource_id = %self.resource_id,
            audit.actor = %self.actor,
            audit.details = %details,
            "audit event"
        );
    }
}
