use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;

use arogya_bedrock::decision::{self, DecisionRequest, ServiceDecision};
use arogya_bedrock::error::BedrockError;

use super::dynamic::DecisionService;

/// [`DecisionService`] over the Bedrock Converse API.
pub struct BedrockDecisionService {
    client: Client,
    model_id: String,
}

impl BedrockDecisionService {
    pub fn new(config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl DecisionService for BedrockDecisionService {
    async fn decide(&self, request: &DecisionRequest) -> Result<ServiceDecision, BedrockError> {
        decision::decide(&self.client, &self.model_id, request).await
    }
}
