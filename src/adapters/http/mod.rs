//! HTTP adapters - Channel grants, the server-side API and the router.

pub mod broadcasting_auth;
pub mod channels_api;
pub mod error;
pub mod middleware;
pub mod router;

pub use error::{ApiError, ErrorResponse};
pub use router::app_router;
