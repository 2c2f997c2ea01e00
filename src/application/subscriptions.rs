//! SubscriptionIndex - Who is subscribed to what, in both directions.
//!
//! Two tables back the index:
//!
//! - `subscriptions`: connection id -> set of channel names
//! - `channels`: channel name -> [`ChannelRecord`] (type, subscriber set, metadata)
//!
//! The subscriber count is the size of the record's subscriber set, so the
//! count and the set change together in one row update. A record exists
//! only while its set is non-empty.
//!
//! Subscribing writes the connection row before the channel row, and
//! unsubscribing clears the channel row before the connection row. An
//! interrupted sequence can therefore leave a connection row naming a
//! channel it is no longer in, which teardown tolerates, but never a
//! channel record holding a connection that teardown cannot find.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::channel::{ChannelError, ChannelInfo, ChannelType, Payload};
use crate::domain::foundation::ConnectionId;
use crate::ports::SharedTable;

/// One row of the channel table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    pub channel_type: ChannelType,
    pub subscribers: BTreeSet<ConnectionId>,
    pub metadata: Payload,
}

impl ChannelRecord {
    fn new(channel: &str) -> Self {
        Self {
            channel_type: ChannelType::from_name(channel),
            subscribers: BTreeSet::new(),
            metadata: Payload::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            channel_type: self.channel_type,
            subscriber_count: self.subscribers.len(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Bidirectional subscription index over two shared tables.
#[derive(Clone)]
pub struct SubscriptionIndex {
    subscriptions: Arc<dyn SharedTable<BTreeSet<String>>>,
    channels: Arc<dyn SharedTable<ChannelRecord>>,
}

impl SubscriptionIndex {
    pub fn new(
        subscriptions: Arc<dyn SharedTable<BTreeSet<String>>>,
        channels: Arc<dyn SharedTable<ChannelRecord>>,
    ) -> Self {
        Self {
            subscriptions,
            channels,
        }
    }

    /// Add `connection` to `channel`. Returns false if it was already there.
    ///
    /// # Errors
    ///
    /// `Storage` when either table is full. A failed channel insert rolls
    /// back the connection row.
    pub async fn subscribe(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<bool, ChannelError> {
        let key = connection.to_string();
        let name = channel.to_string();
        let already = self.is_subscribed(connection, channel).await?;

        self.subscriptions
            .update(
                &key,
                Box::new(move |current: Option<BTreeSet<String>>| {
                    let mut set = current.unwrap_or_default();
                    set.insert(name);
                    Some(set)
                }),
            )
            .await?;

        let name = channel.to_string();
        let result = self
            .channels
            .update(
                channel,
                Box::new(move |current: Option<ChannelRecord>| {
                    let mut record = current.unwrap_or_else(|| ChannelRecord::new(&name));
                    record.subscribers.insert(connection);
                    Some(record)
                }),
            )
            .await;

        if let Err(err) = result {
            if !already {
                self.remove_from_connection_row(connection, channel).await?;
            }
            return Err(err.into());
        }

        tracing::debug!(connection_id = %connection, channel, "Subscribed");
        Ok(!already)
    }

    /// Remove `connection` from `channel`. Returns false if it was not there.
    ///
    /// Deletes the channel record when its last subscriber leaves.
    pub async fn unsubscribe(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<bool, ChannelError> {
        self.channels
            .update(
                channel,
                Box::new(move |current: Option<ChannelRecord>| {
                    let mut record = current?;
                    record.subscribers.remove(&connection);
                    (!record.subscribers.is_empty()).then_some(record)
                }),
            )
            .await?;

        let was_subscribed = self.remove_from_connection_row(connection, channel).await?;
        if was_subscribed {
            tracing::debug!(connection_id = %connection, channel, "Unsubscribed");
        }
        Ok(was_subscribed)
    }

    async fn remove_from_connection_row(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<bool, ChannelError> {
        let was_subscribed = self.is_subscribed(connection, channel).await?;
        let name = channel.to_string();
        self.subscriptions
            .update(
                &connection.to_string(),
                Box::new(move |current: Option<BTreeSet<String>>| {
                    let mut set = current?;
                    set.remove(&name);
                    (!set.is_empty()).then_some(set)
                }),
            )
            .await?;
        Ok(was_subscribed)
    }

    pub async fn channels_of(&self, connection: ConnectionId) -> Result<BTreeSet<String>, ChannelError> {
        Ok(self
            .subscriptions
            .get(&connection.to_string())
            .await?
            .unwrap_or_default())
    }

    pub async fn subscribers_of(&self, channel: &str) -> Result<BTreeSet<ConnectionId>, ChannelError> {
        Ok(self
            .channels
            .get(channel)
            .await?
            .map(|record| record.subscribers)
            .unwrap_or_default())
    }

    pub async fn is_subscribed(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<bool, ChannelError> {
        Ok(self
            .subscriptions
            .get(&connection.to_string())
            .await?
            .map(|set| set.contains(channel))
            .unwrap_or(false))
    }

    pub async fn channel_record(&self, channel: &str) -> Result<Option<ChannelRecord>, ChannelError> {
        Ok(self.channels.get(channel).await?)
    }

    pub async fn channel_exists(&self, channel: &str) -> Result<bool, ChannelError> {
        Ok(self.channels.exists(channel).await?)
    }

    pub async fn channel_info(&self, channel: &str) -> Result<Option<ChannelInfo>, ChannelError> {
        Ok(self.channels.get(channel).await?.map(|record| record.info()))
    }

    /// Every channel that currently has subscribers.
    pub async fn all_channels(&self) -> Result<BTreeMap<String, ChannelInfo>, ChannelError> {
        Ok(self
            .channels
            .entries()
            .await?
            .into_iter()
            .map(|(name, record)| (name, record.info()))
            .collect())
    }

    /// Merge keys into a channel's metadata. Returns false if the channel
    /// has no record.
    pub async fn merge_metadata(&self, channel: &str, metadata: Payload) -> Result<bool, ChannelError> {
        let updated = self
            .channels
            .update(
                channel,
                Box::new(move |current: Option<ChannelRecord>| {
                    let mut record = current?;
                    record.metadata.extend(metadata);
                    Some(record)
                }),
            )
            .await?;
        Ok(updated.is_some())
    }
}
