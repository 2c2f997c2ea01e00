//! Adapters - Implementations of port interfaces and the transport.
//!
//! - `storage` - Shared tables and the connection registry
//! - `rate_limiter` - Fixed-window limiter over a shared table
//! - `clock` - Wall and manual clocks
//! - `websocket` - Upgrade handler, socket loop and outbound queues
//! - `http` - Channel grants, server API and the router

pub mod clock;
pub mod http;
pub mod rate_limiter;
pub mod storage;
pub mod websocket;
