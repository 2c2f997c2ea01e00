//! Application layer - Channel operations, pipelines and connection lifecycle.
//!
//! This layer coordinates the domain types through ports. It owns no
//! sockets; the websocket adapter drives it through [`LifecycleController`].

pub mod broadcaster;
pub mod channel_manager;
pub mod channels;
pub mod client;
pub mod lifecycle;
pub mod pipeline;
pub mod presence;
pub mod subscriptions;

pub use broadcaster::Broadcaster;
pub use channel_manager::ChannelManager;
pub use channels::{Authorization, ChannelHandler, ChannelHandlers};
pub use client::ChannelClient;
pub use lifecycle::{Connection, ConnectionState, LifecycleController};
pub use pipeline::{PipelineManager, Pipelines};
pub use presence::PresenceTable;
pub use subscriptions::{ChannelRecord, SubscriptionIndex};
