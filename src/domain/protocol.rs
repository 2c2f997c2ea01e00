//! Wire protocol: inbound client frames and outbound event envelopes.
//!
//! Every frame is a JSON text message. Inbound frames carry an `event`
//! name, usually a `channel`, and an optional `data` object. Outbound
//! frames are `{event, data}` for connection-level events and
//! `{event, channel, data}` for channel events.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::channel::{ChannelError, Payload};
use crate::domain::foundation::{ConnectionId, ErrorCode};

/// Default event name for `message` frames without a `name`.
pub const DEFAULT_PUBLISH_EVENT: &str = "message";

/// Raw inbound frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Subscribe { channel: String, data: Payload },
    Unsubscribe { channel: String },
    Publish { channel: String, event: String, data: Payload },
    ChannelEvent { channel: String, event: String, data: Payload },
    /// A custom event with no channel. Logged and ignored.
    Unrouted { event: String },
}

impl ClientFrame {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// `Malformed` when the text is not a JSON object with a string `event`.
    pub fn parse(text: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(text).map_err(|_| ChannelError::malformed("Invalid message format"))
    }

    /// Route the frame by its event name.
    pub fn into_command(self) -> Result<ClientCommand, ChannelError> {
        match self.event.as_str() {
            "subscribe" => {
                let channel = self.channel.ok_or_else(|| {
                    ChannelError::malformed("Channel name is required for subscription")
                })?;
                let data = payload_of(self.data)?;
                Ok(ClientCommand::Subscribe { channel, data })
            }
            "unsubscribe" => {
                let channel = self.channel.ok_or_else(|| {
                    ChannelError::malformed("Channel name is required for unsubscription")
                })?;
                Ok(ClientCommand::Unsubscribe { channel })
            }
            "message" => match (self.channel, self.data) {
                (Some(channel), Some(data)) => Ok(ClientCommand::Publish {
                    channel,
                    event: self
                        .name
                        .unwrap_or_else(|| DEFAULT_PUBLISH_EVENT.to_string()),
                    data: payload_of(Some(data))?,
                }),
                _ => Err(ChannelError::malformed(
                    "Channel and data are required for publishing",
                )),
            },
            _ => match self.channel {
                Some(channel) => Ok(ClientCommand::ChannelEvent {
                    channel,
                    data: payload_of(self.data)?,
                    event: self.event,
                }),
                None => Ok(ClientCommand::Unrouted { event: self.event }),
            },
        }
    }
}

fn payload_of(data: Option<Value>) -> Result<Payload, ChannelError> {
    match data {
        None | Some(Value::Null) => Ok(Payload::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(ChannelError::malformed("Event data must be an object")),
    }
}

/// Connection-level events pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    ConnectionEstablished {
        socket_id: ConnectionId,
        activity_timeout: u64,
    },
    SubscriptionSucceeded {
        channel: String,
    },
    SubscriptionError {
        channel: String,
        message: String,
    },
    Unsubscribed {
        channel: String,
    },
    Error {
        message: String,
        code: u16,
    },
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
            code: code.wire_code(),
        }
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ConnectionEstablished { .. } => "connection_established",
            ServerEvent::SubscriptionSucceeded { .. } => "subscription_succeeded",
            ServerEvent::SubscriptionError { .. } => "subscription_error",
            ServerEvent::Unsubscribed { .. } => "unsubscribed",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// The `{event, data}` envelope for this event.
    pub fn to_frame(&self) -> String {
        let mut data = Payload::new();
        let mut put = |key: &str, value: Value| {
            data.insert(key.to_string(), value);
        };
        match self {
            ServerEvent::ConnectionEstablished {
                socket_id,
                activity_timeout,
            } => {
                put("socket_id", Value::from(socket_id.as_u64()));
                put("activity_timeout", Value::from(*activity_timeout));
            }
            ServerEvent::SubscriptionSucceeded { channel } | ServerEvent::Unsubscribed { channel } => {
                put("channel", Value::from(channel.as_str()));
            }
            ServerEvent::SubscriptionError { channel, message } => {
                put("channel", Value::from(channel.as_str()));
                put("message", Value::from(message.as_str()));
            }
            ServerEvent::Error { message, code } => {
                put("message", Value::from(message.as_str()));
                put("code", Value::from(*code));
            }
        }
        event_frame(self.name(), None, &data)
    }
}

/// Envelope for a channel event or a direct whisper.
pub fn event_frame(event: &str, channel: Option<&str>, data: &Payload) -> String {
    match channel {
        Some(channel) => json!({ "event": event, "channel": channel, "data": data }),
        None => json!({ "event": event, "data": data }),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str) -> Result<ClientCommand, ChannelError> {
        ClientFrame::parse(text)?.into_command()
    }

    // ─── Inbound ───────────────────────────────────────────────────────

    #[test]
    fn parses_subscribe_with_auth_data() {
        let cmd = command(r#"{"event":"subscribe","channel":"private-a","data":{"auth":"abc"}}"#)
            .unwrap();
        match cmd {
            ClientCommand::Subscribe { channel, data } => {
                assert_eq!(channel, "private-a");
                assert_eq!(data.get("auth"), Some(&json!("abc")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn subscribe_without_data_has_empty_payload() {
        let cmd = command(r#"{"event":"subscribe","channel":"news"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Subscribe {
                channel: "news".into(),
                data: Payload::new()
            }
        );
    }

    #[test]
    fn subscribe_without_channel_is_malformed() {
        let err = command(r#"{"event":"subscribe"}"#).unwrap_err();
        assert_eq!(
            err,
            ChannelError::malformed("Channel name is required for subscription")
        );
    }

    #[test]
    fn message_uses_name_or_default() {
        let named =
            command(r#"{"event":"message","channel":"news","name":"tick","data":{"n":1}}"#)
                .unwrap();
        assert!(matches!(named, ClientCommand::Publish { ref event, .. } if event == "tick"));

        let unnamed = command(r#"{"event":"message","channel":"news","data":{}}"#).unwrap();
        assert!(matches!(unnamed, ClientCommand::Publish { ref event, .. } if event == "message"));
    }

    #[test]
    fn message_requires_channel_and_data() {
        assert!(command(r#"{"event":"message","channel":"news"}"#).is_err());
        assert!(command(r#"{"event":"message","data":{}}"#).is_err());
    }

    #[test]
    fn custom_event_with_channel_is_channel_event() {
        let cmd = command(r#"{"event":"typing","channel":"presence-a","data":{"on":true}}"#)
            .unwrap();
        assert!(matches!(cmd, ClientCommand::ChannelEvent { ref event, .. } if event == "typing"));
    }

    #[test]
    fn custom_event_without_channel_is_unrouted() {
        let cmd = command(r#"{"event":"typing"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Unrouted {
                event: "typing".into()
            }
        );
    }

    #[test]
    fn non_object_data_is_malformed() {
        assert!(command(r#"{"event":"typing","channel":"a","data":[1,2]}"#).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(ClientFrame::parse("not json").is_err());
        assert!(ClientFrame::parse(r#"{"channel":"a"}"#).is_err());
        assert!(ClientFrame::parse(r#"{"event":5}"#).is_err());
    }

    // ─── Outbound ──────────────────────────────────────────────────────

    #[test]
    fn connection_established_envelope() {
        let frame = ServerEvent::ConnectionEstablished {
            socket_id: ConnectionId::new(42),
            activity_timeout: 120,
        }
        .to_frame();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"event": "connection_established", "data": {"socket_id": 42, "activity_timeout": 120}})
        );
    }

    #[test]
    fn error_envelope_carries_wire_code() {
        let frame = ServerEvent::error(ErrorCode::RateLimited, "slow down").to_frame();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"event": "error", "data": {"message": "slow down", "code": 429}})
        );
    }

    #[test]
    fn every_event_has_an_envelope() {
        let cases = [
            (
                ServerEvent::SubscriptionSucceeded {
                    channel: "news".into(),
                },
                json!({"channel": "news"}),
            ),
            (
                ServerEvent::SubscriptionError {
                    channel: "private-a".into(),
                    message: "Invalid authorization signature".into(),
                },
                json!({"channel": "private-a", "message": "Invalid authorization signature"}),
            ),
            (
                ServerEvent::Unsubscribed {
                    channel: "news".into(),
                },
                json!({"channel": "news"}),
            ),
        ];
        for (event, data) in cases {
            let value: Value = serde_json::from_str(&event.to_frame()).unwrap();
            assert_eq!(value, json!({"event": event.name(), "data": data}));
        }
    }

    #[test]
    fn channel_event_envelope() {
        let mut data = Payload::new();
        data.insert("n".into(), json!(1));
        let value: Value =
            serde_json::from_str(&event_frame("tick", Some("news"), &data)).unwrap();
        assert_eq!(
            value,
            json!({"event": "tick", "channel": "news", "data": {"n": 1}})
        );

        let value: Value = serde_json::from_str(&event_frame("hello", None, &data)).unwrap();
        assert!(value.get("channel").is_none());
    }
}
