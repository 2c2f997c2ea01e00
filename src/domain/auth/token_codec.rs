//! HMAC-SHA256 grants for private and presence channels.
//!
//! A private grant is the hex signature of `socket_id:channel`. A presence
//! grant is `signature:document`, where the signature covers
//! `socket_id:channel:document` and `document` is the compact JSON encoding
//! of the member identity. The verifier never needs outside state.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced when a grant fails verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthTokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Signature does not match")]
    SignatureMismatch,

    #[error("Embedded document is not valid JSON")]
    InvalidDocument,
}

/// A presence grant as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceGrant {
    /// `signature:document`
    pub auth: String,
    /// The encoded identity document.
    pub channel_data: String,
}

/// Signs and verifies channel grants with the server secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn sign_private(&self, socket_id: &str, channel: &str) -> String {
        self.sign(&format!("{}:{}", socket_id, channel))
    }

    pub fn sign_presence(&self, socket_id: &str, channel: &str, document: &Value) -> PresenceGrant {
        let channel_data = encode_document(document);
        let signature = self.sign(&format!("{}:{}:{}", socket_id, channel, channel_data));
        PresenceGrant {
            auth: format!("{}:{}", signature, channel_data),
            channel_data,
        }
    }

    pub fn verify_private(&self, signature: &str, socket_id: &str, channel: &str) -> bool {
        let expected = self.sign_private(socket_id, channel);
        constant_time_compare(signature.as_bytes(), expected.as_bytes())
    }

    /// Verifies a presence grant and returns the embedded identity document.
    ///
    /// # Errors
    ///
    /// Fails closed on a missing separator, a signature mismatch, or a
    /// document that does not decode.
    pub fn verify_presence(
        &self,
        token: &str,
        socket_id: &str,
        channel: &str,
    ) -> Result<Value, AuthTokenError> {
        let (signature, channel_data) = token.split_once(':').ok_or(AuthTokenError::Malformed)?;
        if signature.is_empty() || channel_data.is_empty() {
            return Err(AuthTokenError::Malformed);
        }

        let expected = self.sign(&format!("{}:{}:{}", socket_id, channel, channel_data));
        if !constant_time_compare(signature.as_bytes(), expected.as_bytes()) {
            return Err(AuthTokenError::SignatureMismatch);
        }

        serde_json::from_str(channel_data).map_err(|_| AuthTokenError::InvalidDocument)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Canonical compact JSON encoding of an identity document.
pub fn encode_document(document: &Value) -> String {
    document.to_string()
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
