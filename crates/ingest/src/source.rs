//! Object Store Port and In-Memory Implementation

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

/// Errors fetching a source object
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Object not found")]
    NotFound,
    #[error("Object store request failed: {0}")]
    Request(String),
    #[error("Failed to read object body: {0}")]
    Body(String),
}

/// Read access to the blob store holding telemetry batches
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Fetch the full content of `bucket`/`key`
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError>;
}

type ObjectId = (String, String);

/// In-memory object source that records every fetch
#[derive(Debug, Default)]
pub struct MemoryObjectSource {
    objects: Mutex<HashMap<ObjectId, Vec<u8>>>,
    failing: Mutex<HashSet<ObjectId>>,
    fetches: Mutex<Vec<ObjectId>>,
}

impl MemoryObjectSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object
    pub fn insert(&self, bucket: &str, key: &str, content: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert((bucket.to_string(), key.to_string()), content.into());
        }
    }

    /// Make fetches of `bucket`/`key` fail with a request error
    pub fn fail_object(&self, bucket: &str, key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert((bucket.to_string(), key.to_string()));
        }
    }

    /// Every fetch attempted, in order
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectSource for MemoryObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        let id = (bucket.to_string(), key.to_string());
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(id.clone());
        }

        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&id))
            .unwrap_or(false);
        if failing {
            return Err(FetchError::Request("injected failure".to_string()));
        }

        self.objects
            .lock()
            .map_err(|e| FetchError::Request(format!("Lock error: {}", e)))?
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_known_and_unknown() {
        let source = MemoryObjectSource::new();
        source.insert("b", "k", "[]");

        assert_eq!(source.fetch("b", "k").await.unwrap(), b"[]".to_vec());
        assert!(matches!(source.fetch("b", "other").await, Err(FetchError::NotFound)));
        assert_eq!(source.fetches().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = MemoryObjectSource::new();
        source.insert("b", "k", "[]");
        source.fail_object("b", "k");

        assert!(matches!(source.fetch("b", "k").await, Err(FetchError::Request(_))));
    }
}
