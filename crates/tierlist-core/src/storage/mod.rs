//! External key/value storage for image payloads and board snapshots.

mod autosave;
mod memory;
mod vault;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod indexeddb;

pub use autosave::{BoardAutosave, DEFAULT_AUTOSAVE_INTERVAL_SECS, LAST_BOARD_KEY};
pub use memory::MemoryStorage;
pub use vault::ImageVault;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use indexeddb::IndexedDbStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage quota exceeded")]
    QuotaExceeded,
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Addressable string blob store.
///
/// No ordering or transaction guarantees are assumed. Implementations may
/// keep data in memory, on disk or in IndexedDB (WASM).
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait BlobStore: Send + Sync {
    /// Read a value. Missing keys yield `StorageError::NotFound`.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys starting with `prefix`.
    fn list_prefix(&self, prefix: &str) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Addressable string blob store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait BlobStore {
    /// Read a value. Missing keys yield `StorageError::NotFound`.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys starting with `prefix`.
    fn list_prefix(&self, prefix: &str) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}
