//! Client-visible error codes.

use std::fmt;

/// Error categories surfaced to clients in `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedMessage,
    SubscriptionFailure,
    PublishNotAuthorized,
    ChannelNotFound,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// Numeric code carried in the `code` field of an `error` event.
    pub fn wire_code(&self) -> u16 {
        match self {
            ErrorCode::MalformedMessage => 400,
            ErrorCode::SubscriptionFailure => 403,
            ErrorCode::PublishNotAuthorized => 403,
            ErrorCode::ChannelNotFound => 404,
            ErrorCode::RateLimited => 429,
            ErrorCode::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MalformedMessage => "MALFORMED_MESSAGE",
            ErrorCode::SubscriptionFailure => "SUBSCRIPTION_FAILURE",
            ErrorCode::PublishNotAuthorized => "PUBLISH_NOT_AUTHORIZED",
            ErrorCode::ChannelNotFound => "CHANNEL_NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::Internal => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}
