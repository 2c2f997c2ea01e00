//! ChannelClient - Server-side publishing facade.
//!
//! Used by the HTTP API and by any in-process code that needs to push
//! events without holding a socket.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::channel::{ChannelError, ChannelInfo, Payload};
use crate::domain::foundation::ConnectionId;

use super::broadcaster::Broadcaster;
use super::subscriptions::SubscriptionIndex;

#[derive(Clone)]
pub struct ChannelClient {
    subscriptions: SubscriptionIndex,
    broadcaster: Broadcaster,
}

impl ChannelClient {
    pub fn new(subscriptions: SubscriptionIndex, broadcaster: Broadcaster) -> Self {
        Self {
            subscriptions,
            broadcaster,
        }
    }

    /// Broadcast to every subscriber of one channel.
    ///
    /// # Errors
    ///
    /// `NotFound` when nobody is subscribed.
    pub async fn publish(&self, channel: &str, event: &str, data: &Payload) -> Result<usize, ChannelError> {
        self.broadcaster.broadcast(channel, event, data, None).await
    }

    /// Broadcast to several channels, skipping those without subscribers.
    pub async fn publish_to_channels(&self, channels: &[String], event: &str, data: &Payload) -> usize {
        self.broadcaster
            .broadcast_to_many(channels, event, data, None)
            .await
    }

    pub fn whisper(
        &self,
        connection: ConnectionId,
        event: &str,
        data: &Payload,
        channel: Option<&str>,
    ) -> bool {
        self.broadcaster.whisper(connection, event, data, channel)
    }

    pub async fn subscribers(&self, channel: &str) -> Result<BTreeSet<ConnectionId>, ChannelError> {
        self.subscriptions.subscribers_of(channel).await
    }

    pub async fn channel_exists(&self, channel: &str) -> Result<bool, ChannelError> {
        self.subscriptions.channel_exists(channel).await
    }

    pub async fn channel(&self, channel: &str) -> Result<Option<ChannelInfo>, ChannelError> {
        self.subscriptions.channel_info(channel).await
    }

    pub async fn channels(&self) -> Result<BTreeMap<String, ChannelInfo>, ChannelError> {
        self.subscriptions.all_channels().await
    }

    pub async fn is_subscribed(&self, connection: ConnectionId, channel: &str) -> Result<bool, ChannelError> {
        self.subscriptions.is_subscribed(connection, channel).await
    }
}
