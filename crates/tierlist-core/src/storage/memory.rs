//! In-memory blob store.

use super::{BlobStore, BoxFuture, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
///
/// An optional byte capacity (keys plus values) makes writes fail with
/// `StorageError::QuotaExceeded` the way browser storage does when full.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    /// Create a new empty, unbounded memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory storage holding at most `bytes` of keys and values.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            capacity: Some(bytes),
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl BlobStore for MemoryStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            entries
                .get(&key)
                .cloned()
                .ok_or(StorageError::NotFound(key))
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            if let Some(capacity) = self.capacity {
                let used: usize = entries
                    .iter()
                    .filter(|(k, _)| **k != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                if used + key.len() + value.len() > capacity {
                    return Err(StorageError::QuotaExceeded);
                }
            }
            entries.insert(key, value);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.remove(&key);
            Ok(())
        })
    }

    fn list_prefix(&self, prefix: &str) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let prefix = prefix.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .cloned()
                .collect())
        })
    }
}
