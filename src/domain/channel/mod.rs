//! Channel module - names, types, metadata and presence identity.

mod channel_type;
mod errors;
mod name;
mod presence_member;

pub use channel_type::ChannelType;
pub use errors::ChannelError;
pub use name::validate_channel_name;
pub use presence_member::PresenceMember;

use serde::Serialize;
use serde_json::{Map, Value};

/// Event payloads are JSON objects.
pub type Payload = Map<String, Value>;

/// Snapshot of one channel as reported by listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub subscriber_count: usize,
    pub metadata: Payload,
}
