//! Connection registry backed by a shared table.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::ConnectionId;
use crate::ports::{ConnectionRegistry, SharedTable, StoreError};

/// Stores one row per connection: id -> display label.
#[derive(Clone)]
pub struct TableConnectionRegistry {
    connections: Arc<dyn SharedTable<String>>,
}

impl TableConnectionRegistry {
    pub fn new(connections: Arc<dyn SharedTable<String>>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl ConnectionRegistry for TableConnectionRegistry {
    async fn register(&self, connection: ConnectionId, label: &str) -> Result<(), StoreError> {
        self.connections
            .set(&connection.to_string(), label.to_string())
            .await
    }

    async fn unregister(&self, connection: ConnectionId) -> Result<(), StoreError> {
        self.connections.delete(&connection.to_string()).await?;
        Ok(())
    }

    async fn label_of(&self, connection: ConnectionId) -> Result<Option<String>, StoreError> {
        self.connections.get(&connection.to_string()).await
    }

    async fn exists(&self, connection: ConnectionId) -> Result<bool, StoreError> {
        self.connections.exists(&connection.to_string()).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.connections.len().await
    }
}
