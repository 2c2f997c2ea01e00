//! WebSocket and shared-table configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Socket-level settings and table capacities.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Shared secret. Gates the handshake, signs channel grants and
    /// authenticates the broadcast API.
    pub secret_key: SecretString,

    /// Seconds of silence a client may tolerate before pinging
    #[serde(default = "default_activity_timeout")]
    pub activity_timeout_secs: u64,

    /// Capacity of the connection and subscription tables
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Capacity of the channel table
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,

    /// Capacity of the presence table, one row per connection and
    /// presence channel it has joined
    #[serde(default = "default_max_presence_members")]
    pub max_presence_members: usize,

    /// Longest accepted channel name, in bytes
    #[serde(default = "default_max_channel_name_len")]
    pub max_channel_name_len: usize,
}

impl WebSocketConfig {
    /// Validate websocket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("WEBSOCKET__SECRET_KEY"));
        }
        if self.max_connections == 0 {
            return Err(ValidationError::InvalidCapacity("max_connections"));
        }
        if self.max_channels == 0 {
            return Err(ValidationError::InvalidCapacity("max_channels"));
        }
        if self.max_presence_members == 0 {
            return Err(ValidationError::InvalidCapacity("max_presence_members"));
        }
        if self.max_channel_name_len == 0 {
            return Err(ValidationError::InvalidCapacity("max_channel_name_len"));
        }
        Ok(())
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            secret_key: SecretString::new(String::new()),
            activity_timeout_secs: default_activity_timeout(),
            max_connections: default_max_connections(),
            max_channels: default_max_channels(),
            max_presence_members: default_max_presence_members(),
            max_channel_name_len: default_max_channel_name_len(),
        }
    }
}

fn default_activity_timeout() -> u64 {
    120
}

fn default_max_connections() -> usize {
    10240
}

fn default_max_channels() -> usize {
    1024
}

fn default_max_presence_members() -> usize {
    40960
}

fn default_max_channel_name_len() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_config_defaults() {
        let config = WebSocketConfig::default();
        assert_eq!(config.activity_timeout_secs, 120);
        assert_eq!(config.max_connections, 10240);
        assert_eq!(config.max_channels, 1024);
        assert_eq!(config.max_presence_members, 40960);
        assert_eq!(config.max_channel_name_len, 64);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let config = WebSocketConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("WEBSOCKET__SECRET_KEY"))
        );
    }

    #[test]
    fn test_zero_channel_capacity_is_rejected() {
        let config = WebSocketConfig {
            secret_key: SecretString::new("s3cret".to_string()),
            max_channels: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidCapacity("max_channels"))
        );
    }

    #[test]
    fn test_zero_presence_capacity_is_rejected() {
        let config = WebSocketConfig {
            secret_key: SecretString::new("s3cret".to_string()),
            max_presence_members: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidCapacity("max_presence_members"))
        );
    }

    #[test]
    fn test_secret_is_redacted_in_debug_output() {
        let config = WebSocketConfig {
            secret_key: SecretString::new("s3cret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
