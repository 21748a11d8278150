//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::errors::ConfigError;
use crate::relay::VoiceRelay;

/// Application state shared across all connections.
///
/// The relay is constructed once at startup; connections hold no state of
/// their own beyond their socket.
pub struct AppState {
    /// Validated server configuration
    pub config: ServerConfig,
    /// The shared relay pipeline
    pub relay: Arc<VoiceRelay>,
}

impl AppState {
    /// Build application state from validated configuration.
    ///
    /// Fails when the relay cannot be constructed (e.g. missing
    /// credential), which aborts startup before any connection is
    /// accepted.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, ConfigError> {
        let relay = Arc::new(VoiceRelay::new(config.relay.clone())?);
        Ok(Arc::new(Self { config, relay }))
    }
}
