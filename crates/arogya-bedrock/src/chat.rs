//! Single-turn calls over the Bedrock Converse API.
//!
//! The Converse API takes an inference profile ID (e.g.
//! `us.anthropic.claude-sonnet-4-20250514-v1:0`) as its `model_id`; bare
//! foundation model IDs fail with "on-demand throughput isn't supported".
//!
//! Required IAM permissions for the calling identity:
//!
//! ```text
//! bedrock:InvokeModel
//! ```

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BedrockError;

/// Sampling settings passed as the Converse `inferenceConfig`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InferenceSettings {
    pub max_tokens: i32,
    pub temperature: f32,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// Send one user message to Bedrock and return the reply text.
///
/// Text blocks of the reply are concatenated; other block types are
/// ignored.
pub async fn converse(
    client: &Client,
    model_id: &str,
    system_prompt: &str,
    user_message: &str,
    settings: InferenceSettings,
) -> Result<String, BedrockError> {
    let message = Message::builder()
        .role(ConversationRole::User)
        .content(ContentBlock::Text(user_message.to_string()))
        .build()
        .map_err(|e| BedrockError::Invocation(e.to_string()))?;

    let inference = InferenceConfiguration::builder()
        .max_tokens(settings.max_tokens)
        .temperature(settings.temperature)
        .build();

    let response = client
        .converse()
        .model_id(model_id)
        .system(SystemContentBlock::Text(system_prompt.to_string()))
        .messages(message)
        .inference_config(inference)
        .send()
        .await
        .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

    let output_message = response
        .output()
        .and_then(|o| o.as_message().ok())
        .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

    let response_text = output_message
        .content()
        .iter()
        .filter_map(|block| {
            if let ContentBlock::Text(text) = block {
                Some(text.as_str())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("");

    if let Some(usage) = response.usage() {
        debug!(
            model_id,
            input_tokens = usage.input_tokens(),
            output_tokens = usage.output_tokens(),
            "converse complete"
        );
    }

    Ok(response_text)
}
