//! Speech-to-text over the OpenAI audio transcription endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::config::AudioInputFormat;
use super::{build_http_client, classify_error_response, endpoint_url};
use crate::config::RelayConfig;
use crate::errors::{ConfigError, RelayError, RelayResult};
use crate::relay::Transcriber;

/// Transcription client for `POST /audio/transcriptions`.
///
/// One audio chunk in, one plain-text transcript out. The chunk is
/// uploaded as a multipart file part whose filename hint tells the API
/// which container format to expect; `response_format=text` keeps the
/// response body to the bare transcript.
pub struct OpenAiTranscriber {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    language: Option<String>,
    input_format: AudioInputFormat,
}

impl OpenAiTranscriber {
    /// Build the transcriber from validated relay configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: build_http_client()?,
            url: endpoint_url(&config.api_base, "audio/transcriptions"),
            api_key: config.api_key.clone(),
            model: config.stt_model.clone(),
            language: config.stt_language.clone(),
            input_format: config.audio_input_format,
        })
    }

    fn build_form(&self, audio: Bytes) -> RelayResult<Form> {
        let file_part = Part::bytes(audio.to_vec())
            .file_name(format!("audio.{}", self.input_format.extension()))
            .mime_str(self.input_format.mime_type())
            .map_err(|e| RelayError::InvalidResponse(format!("Invalid MIME type: {e}")))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        if let Some(ref language) = self.language {
            form = form.text("language", language.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: Bytes) -> RelayResult<String> {
        debug!(bytes = audio.len(), model = %self.model, "submitting audio for transcription");

        let form = self.build_form(audio)?;
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        // response_format=text returns the transcript as the raw body
        response
            .text()
            .await
            .map_err(|e| RelayError::Network(format!("Failed to read transcript: {e}")))
    }
}
