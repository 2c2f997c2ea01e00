//! In-Memory Shared Table Adapter
//!
//! Rows live in a `DashMap`, which locks per shard rather than globally.
//! A separate row counter enforces the fixed capacity without taking
//! every shard lock.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ports::{RowUpdate, SharedTable, StoreError};

/// Fixed-capacity in-process table shared by all connection tasks.
#[derive(Debug)]
pub struct InMemoryTable<V> {
    name: &'static str,
    capacity: usize,
    rows: DashMap<String, V>,
    row_count: AtomicUsize,
}

impl<V> InMemoryTable<V> {
    /// Create an empty table holding at most `capacity` rows.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            rows: DashMap::new(),
            row_count: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn reserve_slot(&self) -> Result<(), StoreError> {
        self.row_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| StoreError::CapacityExceeded {
                table: self.name,
                capacity: self.capacity,
            })
    }

    fn release_slot(&self) {
        self.row_count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl<V> SharedTable<V> for InMemoryTable<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self.rows.get(key).map(|row| row.value().clone()))
    }

    async fn set(&self, key: &str, value: V) -> Result<(), StoreError> {
        match self.rows.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(value);
            }
            Entry::Vacant(vacant) => {
                self.reserve_slot()?;
                vacant.insert(value);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<Option<V>, StoreError> {
        let removed = self.rows.remove(key).map(|(_, value)| value);
        if removed.is_some() {
            self.release_slot();
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.rows.contains_key(key))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.row_count.load(Ordering::Acquire))
    }

    async fn entries(&self) -> Result<Vec<(String, V)>, StoreError> {
        Ok(self
            .rows
            .iter()
            .map(|row| (row.key().clone(), row.value().clone()))
            .collect())
    }

    async fn update(&self, key: &str, update: RowUpdate<V>) -> Result<Option<V>, StoreError> {
        match self.rows.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match update(Some(occupied.get().clone())) {
                Some(next) => {
                    occupied.insert(next.clone());
                    Ok(Some(next))
                }
                None => {
                    occupied.remove();
                    self.release_slot();
                    Ok(None)
                }
            },
            Entry::Vacant(vacant) => match update(None) {
                Some(next) => {
                    self.reserve_slot()?;
                    vacant.insert(next.clone());
                    Ok(Some(next))
                }
                None => Ok(None),
            },
        }
    }
}
