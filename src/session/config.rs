use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the session controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Period of the elapsed-time tick
    /// Default: 1 second
    pub tick_interval: Duration,

    /// Location prefix identifying recording pages
    /// (e.g., "chrome-extension://<id>/index.html")
    pub recording_page: String,

    /// Capacity of the status broadcast channel
    pub bus_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            recording_page: "chrome-extension://web-recorder/index.html".to_string(),
            bus_capacity: 64,
        }
    }
}
