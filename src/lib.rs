//! Channel Relay - Channel-based publish/subscribe over WebSockets.
//!
//! Clients subscribe to named channels and receive every event published
//! to them. Channel type follows from the name: `private-` channels need a
//! signed grant, `presence-` channels also track who is subscribed, and
//! everything else is public.

pub mod adapters;
pub mod application;
pub mod config;
pub mod context;
pub mod domain;
pub mod ports;
