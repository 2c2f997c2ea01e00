//! Storage Adapters
//!
//! Implementations of the shared-state ports.
//!
//! ## Available Adapters
//!
//! - **InMemoryTable** - `SharedTable` over a sharded concurrent map
//! - **TableConnectionRegistry** - `ConnectionRegistry` over a `SharedTable`
//!
//! ## Usage
//!
//! ```ignore
//! use channel_relay::adapters::storage::{InMemoryTable, TableConnectionRegistry};
//!
//! let connections = Arc::new(InMemoryTable::new("connections", 10240));
//! let registry = TableConnectionRegistry::new(connections);
//! ```

mod in_memory_table;
mod table_registry;

pub use in_memory_table::InMemoryTable;
pub use table_registry::TableConnectionRegistry;
