//! Rate limiting port for inbound frames and handshakes.
//!
//! Implementations count events in fixed windows. The first event of a
//! window sets the count to 1; an event that pushes the count past the
//! ceiling is denied.

use async_trait::async_trait;
use std::fmt;

/// Port for rate limiting operations.
///
/// Implementations should be thread-safe and support concurrent access.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one event against the key and decide whether it may proceed.
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Drop the window for a key, e.g. when its connection closes.
    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError>;
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    /// The scope of this rate limit.
    pub scope: RateLimitScope,
    /// Identifier within the scope (connection id or IP address).
    pub identifier: String,
}

/// The scope at which rate limiting is applied.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum RateLimitScope {
    /// Inbound frames from one connection.
    Connection,
    /// Handshakes from one remote address.
    Ip,
}

impl RateLimitKey {
    /// Creates a per-connection key.
    pub fn connection(connection: impl fmt::Display) -> Self {
        Self {
            scope: RateLimitScope::Connection,
            identifier: connection.to_string(),
        }
    }

    /// Creates an IP-based key.
    pub fn ip(ip: impl fmt::Display) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
        }
    }

    /// Row key in the shared counter table.
    pub fn to_storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.scope.as_str(), self.identifier)
    }
}

impl RateLimitScope {
    /// Returns the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Connection => "connection",
            RateLimitScope::Ip => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Event is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Event is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Returns true if the event was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    /// Returns true if the event was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Window state after an allowed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Maximum events allowed in the window.
    pub limit: u32,
    /// Events counted in the current window, this one included.
    pub count: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// Maximum events allowed in the window.
    pub limit: u32,
    /// Seconds until the window resets.
    pub retry_after_secs: u64,
    /// The scope that triggered the denial.
    pub scope: RateLimitScope,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
