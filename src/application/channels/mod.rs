//! Channel type handlers.
//!
//! One handler per [`ChannelType`]. The type is resolved from the channel
//! name at the boundary and the matching handler is looked up in
//! [`ChannelHandlers`].
//!
//! ```text
//! subscribe frame ──► authorize ──► index.subscribe ──► on_subscribe
//! unsubscribe     ──► index.unsubscribe ──► on_unsubscribe
//! message frame   ──► can_publish ──► broadcast (except sender)
//! custom event    ──► on_client_event
//! ```

mod presence;
mod private;
mod public;

pub use presence::PresenceChannelHandler;
pub use private::PrivateChannelHandler;
pub use public::PublicChannelHandler;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::channel::{ChannelError, ChannelType, Payload, PresenceMember};
use crate::domain::foundation::ConnectionId;

use super::broadcaster::Broadcaster;

/// Outcome of a subscription authorization check.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    /// Access granted. Presence grants carry the member identity.
    Granted { member: Option<PresenceMember> },
    /// Access refused, with a reason for the client.
    Denied(String),
}

impl Authorization {
    pub fn granted() -> Self {
        Authorization::Granted { member: None }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Authorization::Denied(reason.into())
    }
}

/// Behaviour that differs between channel types.
#[async_trait]
pub trait ChannelHandler: Send + Sync {
    fn channel_type(&self) -> ChannelType;

    /// Decide whether `connection` may subscribe using the frame's `data`.
    async fn authorize(&self, connection: ConnectionId, channel: &str, data: &Payload) -> Authorization;

    /// Runs after the subscription is recorded.
    async fn on_subscribe(
        &self,
        _connection: ConnectionId,
        _channel: &str,
        _member: Option<&PresenceMember>,
    ) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Runs after the subscription is removed.
    async fn on_unsubscribe(&self, _connection: ConnectionId, _channel: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn can_publish(
        &self,
        _connection: ConnectionId,
        _channel: &str,
        _event: &str,
        _payload: &Payload,
    ) -> bool {
        true
    }

    /// Forward a client-originated event. Returns the delivery count, or
    /// `None` when nothing was forwarded.
    async fn on_client_event(
        &self,
        connection: ConnectionId,
        channel: &str,
        event: &str,
        payload: Payload,
    ) -> Result<Option<usize>, ChannelError>;
}

/// Broadcast a client event verbatim to everyone on the channel but the sender.
pub(crate) async fn forward_except_sender(
    broadcaster: &Broadcaster,
    connection: ConnectionId,
    channel: &str,
    event: &str,
    payload: &Payload,
) -> Result<Option<usize>, ChannelError> {
    broadcaster
        .broadcast(channel, event, payload, Some(connection))
        .await
        .map(Some)
}

/// Handler lookup by channel type.
#[derive(Clone)]
pub struct ChannelHandlers {
    public: Arc<dyn ChannelHandler>,
    private: Arc<dyn ChannelHandler>,
    presence: Arc<dyn ChannelHandler>,
}

impl ChannelHandlers {
    pub fn new(
        public: Arc<dyn ChannelHandler>,
        private: Arc<dyn ChannelHandler>,
        presence: Arc<dyn ChannelHandler>,
    ) -> Self {
        Self {
            public,
            private,
            presence,
        }
    }

    pub fn for_type(&self, channel_type: ChannelType) -> &Arc<dyn ChannelHandler> {
        match channel_type {
            ChannelType::Public => &self.public,
            ChannelType::Private => &self.private,
            ChannelType::Presence => &self.presence,
        }
    }
}
