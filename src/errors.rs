//! Error types for the voice relay gateway.
//!
//! Two taxonomies exist: fatal configuration errors that abort startup, and
//! per-call relay errors that are recovered inside the pipeline and never
//! reach the connection peer as anything other than an empty audio frame.

use thiserror::Error;

/// Result type for relay stage operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Fatal configuration errors raised during startup.
///
/// Any of these prevents the relay from being constructed; the process
/// exits before a single connection is accepted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or empty
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// An environment variable is present but unparseable
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },

    /// Cross-field validation failed
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Errors raised by a single external call within the relay pipeline.
///
/// These are recovered locally: `VoiceRelay::process` converts every
/// variant into the empty sentinel frame after logging it.
#[derive(Error, Debug, Clone)]
pub enum RelayError {
    /// Request never completed (DNS, connect, TLS, mid-body disconnect)
    #[error("Network error: {0}")]
    Network(String),

    /// Credential rejected by the upstream service
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Upstream returned a non-success status
    #[error("Upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response arrived but could not be interpreted
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl RelayError {
    /// Classify a reqwest transport failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        RelayError::Network(err.to_string())
    }
}
