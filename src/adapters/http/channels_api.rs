//! Server-side API: publish events and inspect channels.
//!
//! All routes require the `x-api-key` header.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ServerContext;
use crate::domain::channel::{ChannelInfo, ChannelType, Payload};

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub success: bool,
    pub sent_to: usize,
}

#[derive(Debug, Serialize)]
pub struct ChannelListResponse {
    pub channels: BTreeMap<String, ChannelInfo>,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub name: String,
    #[serde(flatten)]
    pub info: ChannelInfo,
}

#[derive(Debug, Serialize)]
pub struct PresenceUser {
    pub user_id: String,
    pub user_info: Value,
}

#[derive(Debug, Serialize)]
pub struct ChannelUsersResponse {
    pub users: Vec<PresenceUser>,
}

/// `POST /api/broadcast`
pub async fn broadcast(
    State(context): State<Arc<ServerContext>>,
    Json(body): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    let event = body
        .event
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;
    let data: Payload = match body.data {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => {
            return Err(ApiError::BadRequest("Missing required fields".to_string()))
        }
        Some(_) => return Err(ApiError::BadRequest("Event data must be an object".to_string())),
    };

    let sent_to = match (body.channel, body.channels) {
        (Some(channel), _) => context.client.publish(&channel, &event, &data).await?,
        (None, Some(channels)) if !channels.is_empty() => {
            context
                .client
                .publish_to_channels(&channels, &event, &data)
                .await
        }
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };

    tracing::info!(event = %event, sent_to, "API broadcast");
    Ok(Json(BroadcastResponse {
        success: true,
        sent_to,
    }))
}

/// `GET /api/channels`
pub async fn list_channels(
    State(context): State<Arc<ServerContext>>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let channels = context.client.channels().await?;
    Ok(Json(ChannelListResponse { channels }))
}

/// `GET /api/channels/:name`
pub async fn get_channel(
    State(context): State<Arc<ServerContext>>,
    Path(name): Path<String>,
) -> Result<Json<ChannelResponse>, ApiError> {
    let info = context
        .client
        .channel(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Channel not found: {}", name)))?;
    Ok(Json(ChannelResponse { name, info }))
}

/// `GET /api/channels/:name/users`
///
/// One entry per distinct user, even when a user holds several connections.
pub async fn get_channel_users(
    State(context): State<Arc<ServerContext>>,
    Path(name): Path<String>,
) -> Result<Json<ChannelUsersResponse>, ApiError> {
    if !context.client.channel_exists(&name).await? {
        return Err(ApiError::NotFound(format!("Channel not found: {}", name)));
    }
    if ChannelType::from_name(&name) != ChannelType::Presence {
        return Err(ApiError::BadRequest(
            "Only presence channels have users".to_string(),
        ));
    }

    let mut seen = BTreeSet::new();
    let users = context
        .presence
        .members_of(&name)
        .await?
        .into_iter()
        .filter(|(_, member)| seen.insert(member.user_id.clone()))
        .map(|(_, member)| PresenceUser {
            user_id: member.user_id,
            user_info: member.user_info,
        })
        .collect();
    Ok(Json(ChannelUsersResponse { users }))
}
