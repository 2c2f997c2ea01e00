//! Presence channels: signed identity, member roster and join/leave events.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::application::broadcaster::Broadcaster;
use crate::application::presence::PresenceTable;
use crate::domain::auth::TokenCodec;
use crate::domain::channel::{ChannelError, ChannelType, Payload, PresenceMember};
use crate::domain::foundation::ConnectionId;

use super::private::auth_token;
use super::{Authorization, ChannelHandler};

pub const MEMBER_ADDED: &str = "member_added";
pub const MEMBER_REMOVED: &str = "member_removed";
const CLIENT_EVENT_PREFIX: &str = "client-";

pub struct PresenceChannelHandler {
    codec: Arc<TokenCodec>,
    presence: PresenceTable,
    broadcaster: Broadcaster,
}

impl PresenceChannelHandler {
    pub fn new(codec: Arc<TokenCodec>, presence: PresenceTable, broadcaster: Broadcaster) -> Self {
        Self {
            codec,
            presence,
            broadcaster,
        }
    }
}

/// `channel_data` may arrive as the encoded string or as an object.
fn client_channel_data(data: &Payload) -> Option<Result<Value, ()>> {
    match data.get("channel_data")? {
        Value::String(encoded) => Some(serde_json::from_str(encoded).map_err(|_| ())),
        Value::Null => None,
        other => Some(Ok(other.clone())),
    }
}

fn member_payload(member: &PresenceMember) -> Payload {
    let mut payload = Payload::new();
    payload.insert("user_id".to_string(), Value::String(member.user_id.clone()));
    payload.insert("user_info".to_string(), member.user_info.clone());
    payload
}

fn client_event_name(event: &str) -> String {
    if event.starts_with(CLIENT_EVENT_PREFIX) {
        event.to_string()
    } else {
        format!("{}{}", CLIENT_EVENT_PREFIX, event)
    }
}

#[async_trait]
impl ChannelHandler for PresenceChannelHandler {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Presence
    }

    async fn authorize(&self, connection: ConnectionId, channel: &str, data: &Payload) -> Authorization {
        let Some(token) = auth_token(data) else {
            return Authorization::denied("Authorization token is required");
        };

        let document = match self
            .codec
            .verify_presence(token, &connection.to_string(), channel)
        {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(connection_id = %connection, channel, error = %e, "Presence grant rejected");
                return Authorization::denied("Invalid authorization signature");
            }
        };

        match client_channel_data(data) {
            Some(Ok(claimed)) if claimed != document => {
                return Authorization::denied("Channel data does not match authorization");
            }
            Some(Err(())) => return Authorization::denied("Channel data is not valid JSON"),
            _ => {}
        }

        match PresenceMember::from_document(&document) {
            Some(member) => Authorization::Granted {
                member: Some(member),
            },
            None => Authorization::denied("Presence channels require a user_id"),
        }
    }

    async fn on_subscribe(
        &self,
        connection: ConnectionId,
        channel: &str,
        member: Option<&PresenceMember>,
    ) -> Result<(), ChannelError> {
        let member = member
            .cloned()
            .ok_or_else(|| ChannelError::refused(channel, "Presence channels require a user_id"))?;

        self.presence.join(connection, channel, member.clone()).await?;

        match self
            .broadcaster
            .broadcast(channel, MEMBER_ADDED, &member_payload(&member), Some(connection))
            .await
        {
            Ok(_) | Err(ChannelError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        for (other, existing) in self.presence.members_of(channel).await? {
            if other != connection {
                self.broadcaster.whisper(
                    connection,
                    MEMBER_ADDED,
                    &member_payload(&existing),
                    Some(channel),
                );
            }
        }

        tracing::debug!(connection_id = %connection, channel, user_id = %member.user_id, "Member added");
        Ok(())
    }

    async fn on_unsubscribe(&self, connection: ConnectionId, channel: &str) -> Result<(), ChannelError> {
        let Some(member) = self.presence.leave(connection, channel).await? else {
            return Ok(());
        };

        match self
            .broadcaster
            .broadcast(channel, MEMBER_REMOVED, &member_payload(&member), Some(connection))
            .await
        {
            Ok(_) | Err(ChannelError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        tracing::debug!(connection_id = %connection, channel, user_id = %member.user_id, "Member removed");
        Ok(())
    }

    async fn on_client_event(
        &self,
        connection: ConnectionId,
        channel: &str,
        event: &str,
        mut payload: Payload,
    ) -> Result<Option<usize>, ChannelError> {
        if let Some(member) = self.presence.member(connection, channel).await? {
            payload.extend(member_payload(&member));
        }

        self.broadcaster
            .broadcast(channel, &client_event_name(event), &payload, Some(connection))
            .await
            .map(Some)
    }
}
