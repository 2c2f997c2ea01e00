//! Rate limit configuration types.
//!
//! Window length and ceiling for each scope the limiter counts.

use serde::{Deserialize, Serialize};

use crate::config::RateLimitSettings;
use crate::ports::RateLimitScope;

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Inbound frames per connection.
    pub per_connection: WindowLimits,
    /// Handshakes per remote address.
    pub per_ip: WindowLimits,
}

/// Ceiling and window for one scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowLimits {
    /// Maximum events per window.
    pub limit: u32,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn limits_for(&self, scope: RateLimitScope) -> WindowLimits {
        match scope {
            RateLimitScope::Connection => self.per_connection,
            RateLimitScope::Ip => self.per_ip,
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            per_connection: WindowLimits {
                limit: settings.messages_per_window,
                window_secs: settings.window_secs,
            },
            per_ip: WindowLimits {
                limit: settings.connections_per_minute,
                window_secs: 60,
            },
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}
