//! Telemetry Initialization
//!
//! Subscriber setup for the service binary; library code only emits
//! `tracing` events and never installs a subscriber itself.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Telemetry configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Default level when RUST_LOG is not set
    pub log_level: String,
    /// Emit one JSON object per line instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "governor-service".to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_ok() {
        tracing::info!(service = %config.service_name, "Telemetry initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = TelemetryConfig::default();
        init_tracing(&config);
        init_tracing(&config);
    }
}
