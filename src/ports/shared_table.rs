//! SharedTable port - Fixed-capacity key/value rows shared by every worker.
//!
//! Each operation is atomic for a single key. There are no cross-key
//! transactions: callers that maintain an invariant spanning two rows must
//! order their writes so an interruption leaves at worst a stale count.

use async_trait::async_trait;

use crate::domain::channel::ChannelError;

/// Read-modify-write step applied to one row under its lock.
///
/// Receives the current value (if any) and returns the value to store.
/// Returning `None` deletes the row.
pub type RowUpdate<V> = Box<dyn FnOnce(Option<V>) -> Option<V> + Send>;

/// Errors that can occur in table operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The table already holds its configured number of rows.
    #[error("table {table} is full (capacity {capacity})")]
    CapacityExceeded { table: &'static str, capacity: usize },

    /// Backend communication failure
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ChannelError {
    fn from(err: StoreError) -> Self {
        ChannelError::Storage(err.to_string())
    }
}

/// Port for a string-keyed table with row-level atomicity.
#[async_trait]
pub trait SharedTable<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Insert or replace a row.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when inserting a new key into a full table.
    async fn set(&self, key: &str, value: V) -> Result<(), StoreError>;

    /// Remove a row, returning its previous value.
    async fn delete(&self, key: &str) -> Result<Option<V>, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;

    /// Snapshot of every row. No ordering guarantee.
    async fn entries(&self) -> Result<Vec<(String, V)>, StoreError>;

    /// Atomically apply `update` to one row and return the stored result.
    async fn update(&self, key: &str, update: RowUpdate<V>) -> Result<Option<V>, StoreError>;
}
