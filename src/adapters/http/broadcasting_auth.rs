//! `POST /broadcasting/auth` - Channel grants for private and presence channels.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::ServerContext;
use crate::domain::channel::ChannelType;

use super::error::ApiError;
use super::middleware::RequireAuth;

#[derive(Debug, Default, Deserialize)]
pub struct ChannelAuthRequest {
    #[serde(default)]
    pub socket_id: Option<Value>,
    #[serde(default)]
    pub channel_name: Option<String>,
}

impl ChannelAuthRequest {
    /// The socket id as signed. Clients may send it as a number or a string.
    fn socket_id(&self) -> Option<String> {
        match self.socket_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn channel_name(&self) -> Option<&str> {
        self.channel_name.as_deref().filter(|s| !s.is_empty())
    }
}

pub async fn authorize_channel(
    State(context): State<Arc<ServerContext>>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChannelAuthRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(socket_id), Some(channel)) = (body.socket_id(), body.channel_name()) else {
        return Err(ApiError::Unprocessable(
            "Socket ID and channel name are required".to_string(),
        ));
    };

    match ChannelType::from_name(channel) {
        ChannelType::Private => {
            let auth = context.codec.sign_private(&socket_id, channel);
            tracing::debug!(user_id = %user.id, channel, "Private grant issued");
            Ok(Json(json!({ "auth": auth })))
        }
        ChannelType::Presence => {
            let document = json!({
                "user_id": user.id,
                "user_info": { "name": user.display_name() },
            });
            let grant = context.codec.sign_presence(&socket_id, channel, &document);
            tracing::debug!(user_id = %user.id, channel, "Presence grant issued");
            Ok(Json(json!({
                "auth": grant.auth,
                "channel_data": grant.channel_data,
            })))
        }
        ChannelType::Public => Err(ApiError::BadRequest(
            "Public channels do not need authentication".to_string(),
        )),
    }
}
