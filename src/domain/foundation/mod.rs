//! Foundation module - Shared domain primitives.
//!
//! Identifiers and error codes used across every layer.

mod errors;
mod ids;

pub use errors::ErrorCode;
pub use ids::{ConnectionId, ConnectionIdSequence};
