//! Broadcaster - Fan-out of channel events to current subscribers.
//!
//! The envelope is serialized once per call. Each subscriber is checked for
//! liveness before its push; dead or unreachable connections are skipped
//! and never retried.

use std::sync::Arc;

use crate::domain::channel::{ChannelError, Payload};
use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::{event_frame, ServerEvent};
use crate::ports::ConnectionSink;

use super::subscriptions::SubscriptionIndex;

#[derive(Clone)]
pub struct Broadcaster {
    subscriptions: SubscriptionIndex,
    sink: Arc<dyn ConnectionSink>,
}

impl Broadcaster {
    pub fn new(subscriptions: SubscriptionIndex, sink: Arc<dyn ConnectionSink>) -> Self {
        Self {
            subscriptions,
            sink,
        }
    }

    /// Send `{event, channel, data}` to every subscriber except `exclude`.
    ///
    /// Returns how many connections accepted the frame.
    ///
    /// # Errors
    ///
    /// `NotFound` when the channel has no subscribers.
    pub async fn broadcast(
        &self,
        channel: &str,
        event: &str,
        payload: &Payload,
        exclude: Option<ConnectionId>,
    ) -> Result<usize, ChannelError> {
        let record = self
            .subscriptions
            .channel_record(channel)
            .await?
            .ok_or_else(|| ChannelError::NotFound(channel.to_string()))?;

        let frame = event_frame(event, Some(channel), payload);
        let mut sent = 0;
        for subscriber in record.subscribers {
            if Some(subscriber) == exclude {
                continue;
            }
            if self.sink.is_live(subscriber) && self.sink.push(subscriber, frame.clone()) {
                sent += 1;
            }
        }

        tracing::debug!(channel, event, sent, "Broadcast");
        Ok(sent)
    }

    /// Broadcast to each channel independently and sum the deliveries.
    ///
    /// A failing channel is logged and skipped.
    pub async fn broadcast_to_many(
        &self,
        channels: &[String],
        event: &str,
        payload: &Payload,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let mut total = 0;
        for channel in channels {
            match self.broadcast(channel, event, payload, exclude).await {
                Ok(sent) => total += sent,
                Err(e) => {
                    tracing::warn!(channel = %channel, event, error = %e, "Broadcast skipped");
                }
            }
        }
        total
    }

    /// Send an event straight to one connection.
    ///
    /// Returns false if the connection is not live.
    pub fn whisper(
        &self,
        connection: ConnectionId,
        event: &str,
        payload: &Payload,
        channel: Option<&str>,
    ) -> bool {
        if !self.sink.is_live(connection) {
            return false;
        }
        self.sink
            .push(connection, event_frame(event, channel, payload))
    }

    /// Send a connection-level server event to one connection.
    pub fn notify(&self, connection: ConnectionId, event: &ServerEvent) -> bool {
        if !self.sink.is_live(connection) {
            return false;
        }
        self.sink.push(connection, event.to_frame())
    }
}
