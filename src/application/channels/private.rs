//! Private channels: subscription needs a grant signed for this socket.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::broadcaster::Broadcaster;
use crate::domain::auth::TokenCodec;
use crate::domain::channel::{ChannelError, ChannelType, Payload};
use crate::domain::foundation::ConnectionId;

use super::{forward_except_sender, Authorization, ChannelHandler};

pub struct PrivateChannelHandler {
    codec: Arc<TokenCodec>,
    broadcaster: Broadcaster,
}

impl PrivateChannelHandler {
    pub fn new(codec: Arc<TokenCodec>, broadcaster: Broadcaster) -> Self {
        Self { codec, broadcaster }
    }
}

/// Reads the non-empty `auth` string from subscription data.
pub(super) fn auth_token(data: &Payload) -> Option<&str> {
    data.get("auth")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl ChannelHandler for PrivateChannelHandler {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Private
    }

    async fn authorize(&self, connection: ConnectionId, channel: &str, data: &Payload) -> Authorization {
        let Some(token) = auth_token(data) else {
            return Authorization::denied("Authorization token is required");
        };
        if !self
            .codec
            .verify_private(token, &connection.to_string(), channel)
        {
            tracing::debug!(connection_id = %connection, channel, "Private grant rejected");
            return Authorization::denied("Invalid authorization signature");
        }
        Authorization::granted()
    }

    async fn on_client_event(
        &self,
        connection: ConnectionId,
        channel: &str,
        event: &str,
        payload: Payload,
    ) -> Result<Option<usize>, ChannelError> {
        forward_except_sender(&self.broadcaster, connection, channel, event, &payload).await
    }
}
