//! Speech synthesis over the OpenAI audio speech endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{build_http_client, classify_error_response, endpoint_url};
use crate::config::RelayConfig;
use crate::errors::{ConfigError, RelayError, RelayResult};
use crate::relay::Synthesizer;

/// Synthesis client for `POST /audio/speech`.
///
/// Returns the encoded audio bytes exactly as produced by the API; the
/// relay forwards them to the peer without inspection.
pub struct OpenAiSpeech {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    voice: String,
    response_format: String,
}

impl OpenAiSpeech {
    /// Build the synthesis client from validated relay configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: build_http_client()?,
            url: endpoint_url(&config.api_base, "audio/speech"),
            api_key: config.api_key.clone(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            response_format: config.tts_format.clone(),
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> RelayResult<Bytes> {
        debug!(model = %self.model, voice = %self.voice, chars = text.len(), "requesting speech synthesis");

        let body = json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": self.response_format,
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        response
            .bytes()
            .await
            .map_err(|e| RelayError::Network(format!("Failed to read audio body: {e}")))
    }
}
