//! Domain layer - channel vocabulary, wire protocol and grant cryptography.
//!
//! Nothing here touches I/O. Shared state lives behind the ports.

pub mod auth;
pub mod channel;
pub mod foundation;
pub mod protocol;
