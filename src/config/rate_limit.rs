//! Rate limit configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Fixed-window ceilings for inbound frames and handshakes.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Frames a single connection may send per window
    #[serde(default = "default_messages_per_window")]
    pub messages_per_window: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Handshakes a single remote address may attempt per minute
    #[serde(default = "default_connections_per_minute")]
    pub connections_per_minute: u32,
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.messages_per_window == 0 || self.window_secs == 0 || self.connections_per_minute == 0
        {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            messages_per_window: default_messages_per_window(),
            window_secs: default_window_secs(),
            connections_per_minute: default_connections_per_minute(),
        }
    }
}

fn default_messages_per_window() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    60
}

fn default_connections_per_minute() -> u32 {
    10
}
