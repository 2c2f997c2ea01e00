//! WebSocket adapters.
//!
//! ```text
//!  socket task (one per connection)          any task
//!  ┌──────────────────────────────┐   ┌─────────────────────┐
//!  │ reader ─► LifecycleController │   │ Broadcaster.push()  │
//!  │ writer ◄─ outbound queue ◄────┼───┤                     │
//!  └──────────────────────────────┘   └─────────────────────┘
//! ```
//!
//! - [`handler`] - Axum upgrade handler and socket loop
//! - [`outbound`] - Per-connection outbound queues

pub mod handler;
pub mod outbound;

pub use handler::{websocket_router, ws_handler};
pub use outbound::OutboundConnections;
