//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port.
//!
//! ## Available Adapters
//!
//! - `FixedWindowRateLimiter` - Fixed-window counters kept in a `SharedTable`
//!
//! ## Usage
//!
//! ```ignore
//! use channel_relay::adapters::rate_limiter::{FixedWindowRateLimiter, RateLimitConfig};
//!
//! let windows = Arc::new(InMemoryTable::new("rate_limits", 10240));
//! let limiter = FixedWindowRateLimiter::new(windows, RateLimitConfig::default(), Arc::new(SystemClock));
//! ```

mod config;
mod fixed_window;

pub use config::{RateLimitConfig, WindowLimits};
pub use fixed_window::{FixedWindowRateLimiter, WindowState};
