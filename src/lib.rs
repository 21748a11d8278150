pub mod config;
pub mod errors;
pub mod handlers;
pub mod providers;
pub mod relay;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::{RelayConfig, ServerConfig};
pub use errors::{ConfigError, RelayError, RelayResult};
pub use relay::{RelayOutcome, VoiceRelay};
pub use state::AppState;
