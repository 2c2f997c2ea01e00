//! HTTP middleware for axum.
//!
//! - `api_key` - Shared-secret gate for the server-side API
//! - `identity` - Forwarded user identity and the `RequireAuth` extractor

pub mod api_key;
pub mod identity;

pub use api_key::{api_key_middleware, API_KEY_HEADER};
pub use identity::{identity_middleware, AuthenticatedUser, RequireAuth};
