//! File-based blob store for native platforms.

use super::{BlobStore, BoxFuture, StorageError, StorageResult};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const BLOB_EXTENSION: &str = "blob";

/// File-based storage for native platforms.
///
/// Stores one file per key in a specified directory. Keys are
/// percent-encoded into file names so they can be listed back losslessly.
pub struct FileStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/tierlist/blobs/`
    /// On Windows: `%LOCALAPPDATA%\tierlist\blobs\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("tierlist").join("blobs"))
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let name = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();
        self.base_path.join(format!("{}.{}", name, BLOB_EXTENSION))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

fn map_write_error(path: &std::path::Path, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => StorageError::QuotaExceeded,
        _ => StorageError::Io(format!("Failed to write {}: {}", path.display(), e)),
    }
}

impl BlobStore for FileStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.blob_path(key);
        let key = key.to_string();

        Box::pin(async move {
            fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(key),
                _ => StorageError::Io(format!("Failed to read {}: {}", path.display(), e)),
            })
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);
        let value = value.to_string();

        Box::pin(async move { fs::write(&path, value).map_err(|e| map_write_error(&path, e)) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list_prefix(&self, prefix: &str) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        let prefix = prefix.to_string();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut keys = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e != BLOB_EXTENSION).unwrap_or(true) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if let Ok(key) = percent_decode_str(stem).decode_utf8() {
                    if key.starts_with(&prefix) {
                        keys.push(key.into_owned());
                    }
                }
            }
            Ok(keys)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_set_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("tierlist-image:abc", "data:image/jpeg;base64,AA")).unwrap();
        let loaded = block_on(storage.get("tierlist-image:abc")).unwrap();

        assert_eq!(loaded, "data:image/jpeg;base64,AA");
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.get("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_prefix_recovers_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("tierlist-image:1", "a")).unwrap();
        block_on(storage.set("tierlist-image:2", "b")).unwrap();
        block_on(storage.set("tierlist-board:last", "{}")).unwrap();

        let mut keys = block_on(storage.list_prefix("tierlist-image:")).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["tierlist-image:1", "tierlist-image:2"]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("test", "v")).unwrap();
        block_on(storage.delete("test")).unwrap();
        assert!(block_on(storage.get("test")).is_err());
        block_on(storage.delete("test")).unwrap();
    }

    #[test]
    fn test_file_storage_keys_with_path_characters() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("a/b:c*d", "v")).unwrap();
        assert_eq!(block_on(storage.get("a/b:c*d")).unwrap(), "v");
        assert_eq!(block_on(storage.list_prefix("a/")).unwrap(), vec!["a/b:c*d"]);
    }
}
