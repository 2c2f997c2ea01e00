//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application services and the outside world. Adapters implement
//! these ports.
//!
//! ## Shared State
//!
//! - `SharedTable` - Row-atomic key/value table visible to every worker
//! - `ConnectionRegistry` - Accepted connections and their labels
//! - `RateLimiter` - Fixed-window counters
//!
//! ## Transport
//!
//! - `ConnectionSink` - Fire-and-forget delivery to live sockets
//! - `Clock` - Wall time

mod clock;
mod connection_registry;
mod connection_sink;
mod rate_limiter;
mod shared_table;

pub use clock::Clock;
pub use connection_registry::ConnectionRegistry;
pub use connection_sink::ConnectionSink;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use shared_table::{RowUpdate, SharedTable, StoreError};
