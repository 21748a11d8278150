//! Reply generation over the OpenAI chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::messages::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use super::{build_http_client, classify_error_response, endpoint_url};
use crate::config::RelayConfig;
use crate::errors::{ConfigError, RelayError, RelayResult};
use crate::relay::ReplyGenerator;

/// Chat client for `POST /chat/completions`.
///
/// Each call is a single user-role turn carrying the transcript; no
/// conversation history is kept between calls. Only the first ranked
/// candidate is used.
pub struct OpenAiChat {
    http: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Build the chat client from validated relay configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: build_http_client()?,
            url: endpoint_url(&config.api_base, "chat/completions"),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        })
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiChat {
    async fn generate(&self, transcript: &str) -> RelayResult<String> {
        debug!(model = %self.model, chars = transcript.len(), "requesting chat completion");

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(transcript)],
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(format!("Failed to parse completion: {e}")))?;

        let first = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::InvalidResponse("completion has no choices".to_string()))?;

        // A null content field (e.g. tool-call candidates) counts as an
        // empty reply; the relay short-circuits on it downstream.
        Ok(first.message.content.unwrap_or_default())
    }
}
