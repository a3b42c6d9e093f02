use std::time::Duration;

pub use crate::escalation::ResponseDelivery;

/// Default Bedrock inference profile for the decision service.
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// Tunables for a [`crate::SessionController`] and its collaborators.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on one decision-service call before the fallback applies.
    pub decision_timeout: Duration,
    /// Upper bound on one capture before it completes as a timeout.
    pub capture_timeout: Duration,
    /// How reviewer responses to escalations are observed.
    pub response_delivery: ResponseDelivery,
    pub model_id: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(8),
            capture_timeout: Duration::from_secs(30),
            response_delivery: ResponseDelivery::Poll {
                interval: Duration::from_secs(5),
            },
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}
