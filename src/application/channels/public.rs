//! Public channels: open to everyone.

use async_trait::async_trait;

use crate::application::broadcaster::Broadcaster;
use crate::domain::channel::{ChannelError, ChannelType, Payload};
use crate::domain::foundation::ConnectionId;

use super::{forward_except_sender, Authorization, ChannelHandler};

pub struct PublicChannelHandler {
    broadcaster: Broadcaster,
}

impl PublicChannelHandler {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl ChannelHandler for PublicChannelHandler {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Public
    }

    async fn authorize(&self, _connection: ConnectionId, _channel: &str, _data: &Payload) -> Authorization {
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
