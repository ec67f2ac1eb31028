//! Key-Value Store Port and In-Memory Implementation

use crate::StorageError;
use async_trait::async_trait;
use record_validator::TelemetryRecord;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info};

/// Durable key-value store accepting batched record writes.
///
/// Implementations apply their own retry policy; an `Err` means the batch
/// did not fully land after that policy was exhausted.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write `records` to `table`, returning how many were accepted
    async fn batch_write(
        &self,
        table: &str,
        records: &[TelemetryRecord],
    ) -> Result<usize, StorageError>;
}

/// In-memory store keeping items as JSON documents
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Items per table, in write order
    tables: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
    /// Number of batch_write calls seen
    calls: Mutex<usize>,
    /// 1-based call numbers that should fail
    failing_calls: Mutex<HashSet<usize>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory key-value store");
        Self::default()
    }

    /// Make the `call`-th batch_write (1-based) fail without writing
    pub fn fail_call(&self, call: usize) {
        if let Ok(mut failing) = self.failing_calls.lock() {
            failing.insert(call);
        }
    }

    /// Read back every record in `table`, in write order
    pub fn records(&self, table: &str) -> Result<Vec<TelemetryRecord>, StorageError> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;

        Ok(tables
            .get(table)
            .map(|items| {
                items
                    .iter()
                    .cloned()
                    .map(TelemetryRecord::from_document)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Total items held across tables
    pub fn item_count(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Number of batch_write calls made, failed ones included
    pub fn write_calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn batch_write(
        &self,
        table: &str,
        records: &[TelemetryRecord],
    ) -> Result<usize, StorageError> {
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;
            *calls += 1;
            *calls
        };

        let should_fail = self
            .failing_calls
            .lock()
            .map(|f| f.contains(&call))
            .unwrap_or(false);
        if should_fail {
            return Err(StorageError::Unavailable(format!(
                "injected failure on write call {}",
                call
            )));
        }

        let mut tables = self
            .tables
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;
        let items = tables.entry(table.to_string()).or_default();
        items.extend(records.iter().map(TelemetryRecord::to_document));

        debug!("Wrote {} items to {}", records.len(), table);
        Ok(records.len())
    }
}
