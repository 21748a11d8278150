//! OpenAI-backed implementations of the three relay stages.
//!
//! All three stages are plain REST calls sharing the same authentication
//! and error-classification conventions:
//!
//! - Transcription: `POST {base}/audio/transcriptions` (multipart)
//! - Reply generation: `POST {base}/chat/completions` (JSON)
//! - Speech synthesis: `POST {base}/audio/speech` (JSON)
//!
//! The base URL is configurable so tests can point the clients at a local
//! mock server. No retries and no request timeouts are applied here: a
//! stage fault is reported upward once and the relay converts it to the
//! empty sentinel frame.

pub mod chat;
pub mod config;
pub mod messages;
pub mod speech;
pub mod transcribe;


pub use chat::OpenAiChat;
pub use config::{AudioInputFormat, DEFAULT_API_BASE};
pub use speech::OpenAiSpeech;
pub use transcribe::OpenAiTranscriber;

use reqwest::Client;

use crate::errors::{ConfigError, RelayError};
use messages::ApiErrorEnvelope;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("voxrelay/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by a stage.
///
/// Connection pooling is enabled; no request timeout is set, matching the
/// relay contract that outbound calls run until they complete or fault.
pub(crate) fn build_http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ConfigError::Validation(format!("Failed to create HTTP client: {e}")))
}

/// Join the configured API base with an endpoint path.
pub(crate) fn endpoint_url(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path)
}

/// Convert a non-success response into a classified [`RelayError`].
///
/// Tries the standard OpenAI error envelope first and falls back to the
/// raw body. Consumes the response.
pub(crate) async fn classify_error_response(response: reqwest::Response) -> RelayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.error_type {
            Some(kind) => format!("{} ({})", envelope.error.message, kind),
            None => envelope.error.message,
        },
        Err(_) => {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        }
    };

    match status.as_u16() {
        401 | 403 => RelayError::Authentication(message),
        code => RelayError::Api {
            status: code,
            message,
        },
    }
}
