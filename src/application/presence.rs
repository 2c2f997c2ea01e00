//! PresenceTable - Member identity per (connection, presence channel).

use std::sync::Arc;

use crate::domain::channel::{ChannelError, PresenceMember};
use crate::domain::foundation::ConnectionId;
use crate::ports::SharedTable;

/// Presence membership rows keyed `connection:channel`.
#[derive(Clone)]
pub struct PresenceTable {
    members: Arc<dyn SharedTable<PresenceMember>>,
}

impl PresenceTable {
    pub fn new(members: Arc<dyn SharedTable<PresenceMember>>) -> Self {
        Self { members }
    }

    pub async fn join(
        &self,
        connection: ConnectionId,
        channel: &str,
        member: PresenceMember,
    ) -> Result<(), ChannelError> {
        self.members.set(&row_key(connection, channel), member).await?;
        Ok(())
    }

    /// Remove membership, returning the identity that was held.
    pub async fn leave(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<Option<PresenceMember>, ChannelError> {
        Ok(self.members.delete(&row_key(connection, channel)).await?)
    }

    pub async fn member(
        &self,
        connection: ConnectionId,
        channel: &str,
    ) -> Result<Option<PresenceMember>, ChannelError> {
        Ok(self.members.get(&row_key(connection, channel)).await?)
    }

    /// Every member of a channel, ordered by connection id.
    pub async fn members_of(
        &self,
        channel: &str,
    ) -> Result<Vec<(ConnectionId, PresenceMember)>, ChannelError> {
        let mut members: Vec<_> = self
            .members
            .entries()
            .await?
            .into_iter()
            .filter_map(|(key, member)| {
                let (connection, row_channel) = key.split_once(':')?;
                if row_channel != channel {
                    return None;
                }
                Some((connection.parse().ok()?, member))
            })
            .collect();
        members.sort_by_key(|(connection, _)| *connection);
        Ok(members)
    }
}

fn row_key(connection: ConnectionId, channel: &str) -> String {
    format!("{}:{}", connection, channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryTable;
    use serde_json::json;

    fn table() -> PresenceTable {
        PresenceTable::new(Arc::new(InMemoryTable::new("presence", 16)))
    }

    #[tokio::test]
    async fn join_then_lookup() {
        let presence = table();
        let member = PresenceMember::new("7", json!({"name": "Ann"}));
        presence
            .join(ConnectionId::new(1), "presence-room1", member.clone())
            .await
            .unwrap();

        assert_eq!(
            presence.member(ConnectionId::new(1), "presence-room1").await.unwrap(),
            Some(member)
        );
        assert_eq!(
            presence.member(ConnectionId::new(1), "presence-other").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn leave_returns_identity_once() {
        let presence = table();
        presence
            .join(ConnectionId::new(1), "presence-a", PresenceMember::new("7", json!({})))
            .await
            .unwrap();

        let left = presence.leave(ConnectionId::new(1), "presence-a").await.unwrap();
        assert_eq!(left.map(|m| m.user_id), Some("7".to_string()));
        assert_eq!(presence.leave(ConnectionId::new(1), "presence-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn members_of_filters_by_exact_channel() {
        let presence = table();
        presence
            .join(ConnectionId::new(2), "presence-a", PresenceMember::new("b", json!({})))
            .await
            .unwrap();
        presence
            .join(ConnectionId::new(1), "presence-a", PresenceMember::new("a", json!({})))
            .await
            .unwrap();
        presence
            .join(ConnectionId::new(3), "presence-ab", PresenceMember::new("c", json!({})))
            .await
            .unwrap();

        let members = presence.members_of("presence-a").await.unwrap();
        let ids: Vec<_> = members.iter().map(|(c, m)| (c.as_u64(), m.user_id.as_str())).collect();
        assert_eq!(ids, vec![(1, "a"), (2, "b")]);
    }
}
