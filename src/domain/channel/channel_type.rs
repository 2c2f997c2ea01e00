//! Channel type derived from the channel name.

use serde::{Deserialize, Serialize};
use std::fmt;

const PRIVATE_PREFIX: &str = "private-";
const PRESENCE_PREFIX: &str = "presence-";

/// The access model of a channel.
///
/// Never stored on its own: always recomputed from the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Public,
    Private,
    Presence,
}

impl ChannelType {
    /// Resolves the type from a channel name prefix.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with(PRESENCE_PREFIX) {
            ChannelType::Presence
        } else if name.starts_with(PRIVATE_PREFIX) {
            ChannelType::Private
        } else {
            ChannelType::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Public => "public",
            ChannelType::Private => "private",
            ChannelType::Presence => "presence",
        }
    }

    /// Whether subscribing requires a signed grant.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, ChannelType::Public)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_type_from_prefix() {
        assert_eq!(ChannelType::from_name("news"), ChannelType::Public);
        assert_eq!(ChannelType::from_name("private-orders"), ChannelType::Private);
        assert_eq!(ChannelType::from_name("presence-room1"), ChannelType::Presence);
    }

    #[test]
    fn prefix_must_lead_the_name() {
        assert_eq!(ChannelType::from_name("my-private-room"), ChannelType::Public);
        assert_eq!(ChannelType::from_name("private"), ChannelType::Public);
    }

    #[test]
    fn only_public_is_open() {
        assert!(!ChannelType::Public.requires_auth());
        assert!(ChannelType::Private.requires_auth());
        assert!(ChannelType::Presence.requires_auth());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelType::Presence).unwrap(),
            "\"presence\""
        );
    }
}
