//! ConnectionRegistry port - Live connections and their display labels.
//!
//! Written by the task that owns a socket and read by any task that
//! broadcasts, so implementations must be safe to call concurrently.

use async_trait::async_trait;

use crate::domain::foundation::ConnectionId;

use super::StoreError;

/// Port for tracking accepted connections.
///
/// # Example
///
/// ```ignore
/// // On accept:
/// registry.register(id, &id.label()).await?;
///
/// // On close:
/// registry.unregister(id).await?;
/// ```
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    async fn register(&self, connection: ConnectionId, label: &str) -> Result<(), StoreError>;

    /// Remove a connection. Unknown ids are ignored.
    async fn unregister(&self, connection: ConnectionId) -> Result<(), StoreError>;

    async fn label_of(&self, connection: ConnectionId) -> Result<Option<String>, StoreError>;

    async fn exists(&self, connection: ConnectionId) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
