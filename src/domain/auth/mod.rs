//! Channel grant signing and verification.

mod token_codec;

pub use token_codec::{constant_time_compare, encode_document, AuthTokenError, PresenceGrant, TokenCodec};
