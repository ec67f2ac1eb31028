//! Storage Layer
//!
//! Durable key-value persistence for telemetry records, with a buffered
//! batch write path that evaluates and alerts per record.

mod dynamo;
mod persister;
mod store;

pub use dynamo::{item_to_record, record_to_item, DynamoStore, MAX_BATCH_ITEMS};
pub use persister::{BatchPersister, PersistSummary, DEFAULT_BATCH_SIZE};
pub use store::{KeyValueStore, MemoryStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Conversion error: {0}")]
    Conversion(String),
}
