//! ChannelManager - Routes decoded client frames to channel operations.
//!
//! Failures never close the connection. Subscription refusals come back as
//! `subscription_error`; everything else as `error` with a wire code.

use async_trait::async_trait;

use crate::domain::channel::{validate_channel_name, ChannelError, ChannelType, Payload};
use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::{ClientCommand, ClientFrame, ServerEvent};

use super::broadcaster::Broadcaster;
use super::channels::{Authorization, ChannelHandlers};
use super::pipeline::{MessageContext, MessageHandler, PipelineError};
use super::subscriptions::SubscriptionIndex;

#[derive(Clone)]
pub struct ChannelManager {
    subscriptions: SubscriptionIndex,
    handlers: ChannelHandlers,
    broadcaster: Broadcaster,
    max_channel_name_len: usize,
}

impl ChannelManager {
    pub fn new(
        subscriptions: SubscriptionIndex,
        handlers: ChannelHandlers,
        broadcaster: Broadcaster,
        max_channel_name_len: usize,
    ) -> Self {
        Self {
            subscriptions,
            handlers,
            broadcaster,
            max_channel_name_len,
        }
    }

    /// Handle one inbound text frame, replying to the sender on failure.
    pub async fn handle_frame(&self, connection: ConnectionId, text: &str) {
        if let Err(err) = self.route(connection, text).await {
            tracing::debug!(connection_id = %connection, error = %err, "Frame rejected");
            self.broadcaster.notify(connection, &reply_for(err));
        }
    }

    async fn route(&self, connection: ConnectionId, text: &str) -> Result<(), ChannelError> {
        match ClientFrame::parse(text)?.into_command()? {
            ClientCommand::Subscribe { channel, data } => {
                self.subscribe(connection, &channel, &data).await
            }
            ClientCommand::Unsubscribe { channel } => self.unsubscribe(connection, &channel).await,
            ClientCommand::Publish {
                channel,
                event,
                data,
            } => self.publish(connection, &channel, &event, data).await,
            ClientCommand::ChannelEvent {
                channel,
                event,
                data,
            } => self.client_event(connection, &channel, &event, data).await,
            ClientCommand::Unrouted { event } => {
                tracing::warn!(connection_id = %connection, event = %event, "Event without channel ignored");
                Ok(())
            }
        }
    }

    /// Authorize, record and announce a subscription.
    ///
    /// # Errors
    ///
    /// `SubscriptionRefused` when the channel handler denies access or its
    /// join hook fails. The index is rolled back in the latter case.
    pub async fn subscribe(
        &self,
        connection: ConnectionId,
        channel: &str,
        data: &Payload,
    ) -> Result<(), ChannelError> {
        validate_channel_name(channel, self.max_channel_name_len)?;
        let handler = self.handlers.for_type(ChannelType::from_name(channel));

        let member = match handler.authorize(connection, channel, data).await {
            Authorization::Granted { member } => member,
            Authorization::Denied(reason) => {
                tracing::info!(connection_id = %connection, channel, reason = %reason, "Subscription refused");
                return Err(ChannelError::refused(channel, reason));
            }
        };

        let added = self.subscriptions.subscribe(connection, channel).await?;
        if let Err(err) = handler
            .on_subscribe(connection, channel, member.as_ref())
            .await
        {
            if added {
                self.subscriptions.unsubscribe(connection, channel).await?;
            }
            let reason = match err {
                ChannelError::SubscriptionRefused { reason, .. } => reason,
                other => other.to_string(),
            };
            return Err(ChannelError::refused(channel, reason));
        }

        self.broadcaster.notify(
            connection,
            &ServerEvent::SubscriptionSucceeded {
                channel: channel.to_string(),
            },
        );
        Ok(())
    }

    /// Leave a channel. Confirmed even when the connection was not subscribed.
    pub async fn unsubscribe(&self, connection: ConnectionId, channel: &str) -> Result<(), ChannelError> {
        self.leave(connection, channel).await?;
        self.broadcaster.notify(
            connection,
            &ServerEvent::Unsubscribed {
                channel: channel.to_string(),
            },
        );
        Ok(())
    }

    async fn leave(&self, connection: ConnectionId, channel: &str) -> Result<(), ChannelError> {
        let removed = self.subscriptions.unsubscribe(connection, channel).await?;
        if removed {
            self.handlers
                .for_type(ChannelType::from_name(channel))
                .on_unsubscribe(connection, channel)
                .await?;
        }
        Ok(())
    }

    /// Relay a `message` frame to the other subscribers.
    pub async fn publish(
        &self,
        connection: ConnectionId,
        channel: &str,
        event: &str,
        data: Payload,
    ) -> Result<(), ChannelError> {
        if !self.subscriptions.is_subscribed(connection, channel).await? {
            return Err(ChannelError::NotSubscribed(channel.to_string()));
        }
        let handler = self.handlers.for_type(ChannelType::from_name(channel));
        if !handler.can_publish(connection, channel, event, &data).await {
            return Err(ChannelError::PublishRefused(channel.to_string()));
        }
        self.broadcaster
            .broadcast(channel, event, &data, Some(connection))
            .await?;
        Ok(())
    }

    async fn client_event(
        &self,
        connection: ConnectionId,
        channel: &str,
        event: &str,
        data: Payload,
    ) -> Result<(), ChannelError> {
        if !self.subscriptions.is_subscribed(connection, channel).await? {
            return Err(ChannelError::NotSubscribed(channel.to_string()));
        }
        self.handlers
            .for_type(ChannelType::from_name(channel))
            .on_client_event(connection, channel, event, data)
            .await?;
        Ok(())
    }

    /// Remove a connection from every channel it holds.
    ///
    /// Safe to call more than once. A failing channel is logged and the
    /// rest are still torn down.
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), ChannelError> {
        let channels = self.subscriptions.channels_of(connection).await?;
        for channel in channels {
            if let Err(err) = self.leave(connection, &channel).await {
                tracing::warn!(connection_id = %connection, channel = %channel, error = %err, "Channel teardown failed");
            }
        }
        Ok(())
    }
}

/// Dispatch is the terminal of the message pipeline.
#[async_trait]
impl MessageHandler for ChannelManager {
    async fn handle(&self, message: MessageContext) -> Result<(), PipelineError> {
        self.handle_frame(message.connection, &message.text).await;
        Ok(())
    }
}

fn reply_for(err: ChannelError) -> ServerEvent {
    let code = err.code();
    match err {
        ChannelError::SubscriptionRefused { channel, reason } => ServerEvent::SubscriptionError {
            channel,
            message: reason,
        },
        ChannelError::Malformed(reason) => ServerEvent::error(code, reason),
        ChannelError::Storage(_) => ServerEvent::error(code, "Internal server error"),
        other => ServerEvent::error(code, other.to_string()),
    }
}
