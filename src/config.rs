//! Configuration for the voice relay gateway.
//!
//! Configuration is read once at startup from the process environment
//! (after an optional `.env` file is loaded) and validated before any
//! connection is accepted. The relay itself never touches the environment:
//! it receives an explicit [`RelayConfig`] carved out of [`ServerConfig`].

use crate::errors::ConfigError;
use crate::providers::openai::{AudioInputFormat, DEFAULT_API_BASE};

/// Default bind host
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
const DEFAULT_PORT: u16 = 8000;

/// Server configuration
///
/// Contains everything needed to run the gateway: bind address, CORS
/// policy and the relay pipeline settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind the listener to
    pub host: String,
    /// Port to bind the listener to
    pub port: u16,
    /// Comma-separated allowed CORS origins, or `*` for any.
    /// `None` means same-origin only.
    pub cors_allowed_origins: Option<String>,
    /// Relay pipeline configuration
    pub relay: RelayConfig,
}

/// Relay pipeline configuration
///
/// Validated once at startup and handed to [`crate::relay::VoiceRelay`]
/// by value, so a missing credential is a fatal startup condition rather
/// than a per-request surprise.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// OpenAI API key (required)
    pub api_key: String,
    /// Base URL for all three OpenAI endpoints
    pub api_base: String,
    /// Speech-to-text model
    pub stt_model: String,
    /// Optional ISO-639-1 language hint for transcription
    pub stt_language: Option<String>,
    /// Container format of inbound audio frames (filename hint for the API)
    pub audio_input_format: AudioInputFormat,
    /// Chat completion model used to generate the reply
    pub chat_model: String,
    /// Text-to-speech model
    pub tts_model: String,
    /// Text-to-speech voice
    pub tts_voice: String,
    /// Text-to-speech output format (mp3, opus, aac, flac, wav, pcm)
    pub tts_format: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", DEFAULT_HOST);
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                message: e.to_string(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let cors_allowed_origins = env_opt("CORS_ALLOWED_ORIGINS");

        let config = Self {
            host,
            port,
            cors_allowed_origins,
            relay: RelayConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Socket address string for binding the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation(
                "PORT must be non-zero".to_string(),
            ));
        }
        self.relay.validate()
    }
}

impl RelayConfig {
    /// Load relay settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_opt("OPENAI_API_KEY")
            .ok_or(ConfigError::MissingEnvVar("OPENAI_API_KEY"))?;

        let audio_input_format = match env_opt("AUDIO_INPUT_FORMAT") {
            Some(raw) => raw
                .parse::<AudioInputFormat>()
                .map_err(|message| ConfigError::InvalidValue {
                    name: "AUDIO_INPUT_FORMAT",
                    message,
                })?,
            None => AudioInputFormat::default(),
        };

        Ok(Self {
            api_key,
            api_base: env_or("OPENAI_API_BASE", DEFAULT_API_BASE),
            stt_model: env_or("STT_MODEL", "whisper-1"),
            stt_language: env_opt("STT_LANGUAGE"),
            audio_input_format,
            chat_model: env_or("CHAT_MODEL", "gpt-4o-mini"),
            tts_model: env_or("TTS_MODEL", "tts-1"),
            tts_voice: env_or("TTS_VOICE", "alloy"),
            tts_format: env_or("TTS_FORMAT", "mp3"),
        })
    }

    /// Validate relay settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("OPENAI_API_KEY"));
        }
        if self.api_base.trim().is_empty()
            || !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_API_BASE",
                message: format!("not an http(s) URL: {}", self.api_base),
            });
        }
        for (name, value) in [
            ("STT_MODEL", &self.stt_model),
            ("CHAT_MODEL", &self.chat_model),
            ("TTS_MODEL", &self.tts_model),
            ("TTS_VOICE", &self.tts_voice),
            ("TTS_FORMAT", &self.tts_format),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Read an environment variable, treating empty values as absent.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read an environment variable with a fallback default.
fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}
