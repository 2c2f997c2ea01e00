//! Channel operation errors.

use thiserror::Error;

use crate::domain::foundation::ErrorCode;

/// Errors raised by subscription, publish and broadcast operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel not found: {0}")]
    NotFound(String),

    #[error("Subscription to {channel} refused: {reason}")]
    SubscriptionRefused { channel: String, reason: String },

    #[error("Not subscribed to channel: {0}")]
    NotSubscribed(String),

    #[error("Not authorized to publish to channel: {0}")]
    PublishRefused(String),

    #[error("Invalid channel name: {0}")]
    InvalidName(String),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ChannelError {
    pub fn refused(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        ChannelError::SubscriptionRefused {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ChannelError::Malformed(reason.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ChannelError::NotFound(_) => ErrorCode::ChannelNotFound,
            ChannelError::SubscriptionRefused { .. } => ErrorCode::SubscriptionFailure,
            ChannelError::NotSubscribed(_) | ChannelError::PublishRefused(_) => {
                ErrorCode::PublishNotAuthorized
            }
            ChannelError::InvalidName(_) | ChannelError::Malformed(_) => {
                ErrorCode::MalformedMessage
            }
            ChannelError::Storage(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_client_codes() {
        assert_eq!(
            ChannelError::NotFound("a".into()).code(),
            ErrorCode::ChannelNotFound
        );
        assert_eq!(
            ChannelError::NotSubscribed("a".into()).code(),
            ErrorCode::PublishNotAuthorized
        );
        assert_eq!(
            ChannelError::malformed("x").code(),
            ErrorCode::MalformedMessage
        );
    }

    #[test]
    fn refused_message_names_channel_and_reason() {
        let err = ChannelError::refused("private-a", "Invalid signature");
        assert_eq!(
            err.to_string(),
            "Subscription to private-a refused: Invalid signature"
        );
    }
}
