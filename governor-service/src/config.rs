//! Service Configuration

use serde::{Deserialize, Serialize};

/// Background sweep scheduling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Seconds between landing-entry sweeps
    pub landing_check_interval_secs: u64,
    /// Seconds between daily-update sweeps over landing campaigns
    pub landing_update_interval_secs: u64,
    /// Whether the update sweep runs at all
    pub enable_landing_updates: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            landing_check_interval_secs: 600,
            landing_update_interval_secs: 3600,
            enable_landing_updates: true,
        }
    }
}

impl ServiceConfig {
    /// Tight intervals for development and tests
    pub fn development() -> Self {
        Self {
            landing_check_interval_secs: 1,
            landing_update_interval_secs: 2,
            enable_landing_updates: true,
        }
    }
}
