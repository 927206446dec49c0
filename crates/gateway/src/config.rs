//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

use agentcal_activity::RECENT_ACTIVITY_WINDOW;

/// agentcal gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server name for MCP identification
    pub server_name: String,
    /// Server version
    pub version: String,
    /// Directory of the JSON documents; `None` keeps everything in memory
    pub storage_path: Option<PathBuf>,
    /// Seed demo events when no saved calendar exists
    pub seed: bool,
    /// How long an activity entry counts as recent
    pub recent_window: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_name: "agentcal".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage_path: None,
            seed: false,
            recent_window: RECENT_ACTIVITY_WINDOW,
        }
    }
}
