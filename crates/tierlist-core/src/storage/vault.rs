//! Namespaced image payload storage with a capacity policy.

use super::{BlobStore, StorageError, StorageResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Image payloads kept in external storage under namespaced references.
///
/// References are the namespace followed by a time-ordered UUID, so sorting
/// references sorts them oldest first without relying on the store.
///
/// A freshly stored reference is *held* until [`ImageVault::release`] (or
/// [`ImageVault::remove`]) is called for it. Held references are never
/// pruned or evicted. Clones share the held set.
pub struct ImageVault<S: BlobStore> {
    store: Arc<S>,
    namespace: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl<S: BlobStore> Clone for ImageVault<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            held: Arc::clone(&self.held),
        }
    }
}

impl<S: BlobStore> ImageVault<S> {
    pub fn new(store: Arc<S>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            held: Arc::default(),
        }
    }

    /// Get a reference to the storage backend.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether `content` is a reference into this vault.
    pub fn is_reference(&self, content: &str) -> bool {
        content.starts_with(&self.namespace) && content.len() > self.namespace.len()
    }

    fn fresh_reference(&self) -> String {
        format!("{}{}", self.namespace, Uuid::now_v7())
    }

    /// Protect a reference from pruning and eviction.
    pub(crate) fn hold(&self, reference: &str) {
        match self.held.lock() {
            Ok(mut held) => {
                held.insert(reference.to_string());
            }
            Err(e) => log::warn!("Failed to hold image {}: {}", reference, e),
        }
    }

    /// Drop the protection taken when a reference was stored.
    pub fn release(&self, reference: &str) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(reference);
        }
    }

    /// Whether a reference is stored but not yet released.
    pub fn is_held(&self, reference: &str) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(reference))
            .unwrap_or(false)
    }

    /// Persist a payload under a new, held reference.
    ///
    /// When the store is full the oldest unheld image is evicted and the
    /// write retried once. Returns `None` if the payload could not be
    /// persisted; callers keep the payload in memory only. Callers release
    /// the reference once it is on the board.
    pub async fn store_payload(&self, payload: &str) -> Option<String> {
        let reference = self.fresh_reference();
        self.hold(&reference);

        match self.store.set(&reference, payload).await {
            Ok(()) => return Some(reference),
            Err(StorageError::QuotaExceeded) => {
                log::warn!("Image storage full, evicting oldest image");
            }
            Err(e) => {
                log::warn!("Failed to store image: {}", e);
                return None;
            }
        }

        match self.evict_oldest().await {
            Ok(Some(evicted)) => log::info!("Evicted image {}", evicted),
            Ok(None) => {
                log::warn!("Image storage full with nothing to evict");
                self.release(&reference);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to evict image: {}", e);
                self.release(&reference);
                return None;
            }
        }

        match self.store.set(&reference, payload).await {
            Ok(()) => Some(reference),
            Err(e) => {
                log::warn!("Failed to store image after eviction: {}", e);
                self.release(&reference);
                None
            }
        }
    }

    /// Look up a payload; `None` if the reference is unknown or unreadable.
    pub async fn resolve(&self, reference: &str) -> Option<String> {
        match self.store.get(reference).await {
            Ok(payload) => Some(payload),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("Failed to read image {}: {}", reference, e);
                None
            }
        }
    }

    /// Release and delete a stored payload. Failures are logged and
    /// otherwise ignored.
    pub async fn remove(&self, reference: &str) {
        self.release(reference);
        if let Err(e) = self.store.delete(reference).await {
            log::warn!("Failed to delete image {}: {}", reference, e);
        }
    }

    /// All stored references, oldest first.
    pub async fn references(&self) -> StorageResult<Vec<String>> {
        let mut refs = self.store.list_prefix(&self.namespace).await?;
        refs.sort();
        Ok(refs)
    }

    /// Evict the single oldest unheld payload.
    pub async fn evict_oldest(&self) -> StorageResult<Option<String>> {
        let refs = self.references().await?;
        let Some(oldest) = refs.into_iter().find(|r| !self.is_held(r)) else {
            return Ok(None);
        };
        self.store.delete(&oldest).await?;
        Ok(Some(oldest))
    }

    /// Delete every unheld payload not in `keep`. Returns how many were removed.
    pub async fn prune_except(&self, keep: &HashSet<&str>) -> usize {
        let refs = match self.references().await {
            Ok(refs) => refs,
            Err(e) => {
                log::warn!("Failed to list stored images: {}", e);
                return 0;
            }
        };

        let mut pruned = 0;
        let orphans = refs
            .iter()
            .filter(|r| !keep.contains(r.as_str()) && !self.is_held(r));
        for reference in orphans {
            self.remove(reference).await;
            pruned += 1;
        }
        if pruned > 0 {
            log::info!("Pruned {} unreferenced images", pruned);
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pollster::block_on;

    fn vault(store: MemoryStorage) -> ImageVault<MemoryStorage> {
        ImageVault::new(Arc::new(store), "img:")
    }

    /// Store a payload and release it, as a committed item would.
    fn stored(vault: &ImageVault<MemoryStorage>, payload: &str) -> String {
        let reference = block_on(vault.store_payload(payload)).unwrap();
        vault.release(&reference);
        reference
    }

    #[test]
    fn test_store_and_resolve() {
        let vault = vault(MemoryStorage::new());

        let reference = block_on(vault.store_payload("payload")).unwrap();
        assert!(vault.is_reference(&reference));
        assert_eq!(block_on(vault.resolve(&reference)).as_deref(), Some("payload"));
        assert_eq!(block_on(vault.resolve("img:missing")), None);
    }

    #[test]
    fn test_is_reference() {
        let vault = vault(MemoryStorage::new());
        assert!(vault.is_reference("img:abc"));
        assert!(!vault.is_reference("img:"));
        assert!(!vault.is_reference("data:image/png;base64,AA"));
    }

    #[test]
    fn test_references_are_oldest_first() {
        let vault = vault(MemoryStorage::new());
        let first = block_on(vault.store_payload("a")).unwrap();
        let second = block_on(vault.store_payload("b")).unwrap();
        let third = block_on(vault.store_payload("c")).unwrap();

        assert_eq!(block_on(vault.references()).unwrap(), vec![first, second, third]);
    }

    #[test]
    fn test_full_store_evicts_oldest_and_retries() {
        // Each entry: 4-byte namespace + 36-byte uuid + 10-byte payload = 50.
        let vault = vault(MemoryStorage::with_capacity(120));
        let first = stored(&vault, "0123456789");
        let second = stored(&vault, "0123456789");

        let third = block_on(vault.store_payload("0123456789")).unwrap();

        let refs = block_on(vault.references()).unwrap();
        assert!(!refs.contains(&first));
        assert_eq!(refs, vec![second, third]);
    }

    #[test]
    fn test_oversized_payload_is_abandoned() {
        let vault = vault(MemoryStorage::with_capacity(60));
        let first = stored(&vault, "small");

        let payload = "x".repeat(100);
        assert_eq!(block_on(vault.store_payload(&payload)), None);
        // The single eviction already happened.
        assert!(block_on(vault.resolve(&first)).is_none());
    }

    #[test]
    fn test_prune_except() {
        let vault = vault(MemoryStorage::new());
        let keep = stored(&vault, "a");
        stored(&vault, "b");
        stored(&vault, "c");

        let keep_set: HashSet<&str> = [keep.as_str()].into_iter().collect();
        assert_eq!(block_on(vault.prune_except(&keep_set)), 2);
        assert_eq!(block_on(vault.references()).unwrap(), vec![keep]);
    }

    #[test]
    fn test_prune_leaves_other_namespaces_alone() {
        let vault = vault(MemoryStorage::new());
        block_on(vault.store().set("board:last", "{}")).unwrap();
        block_on(vault.store_payload("a")).unwrap();

        block_on(vault.prune_except(&HashSet::new()));
        assert_eq!(block_on(vault.store().get("board:last")).unwrap(), "{}");
    }

    #[test]
    fn test_held_references_survive_prune_until_released() {
        let vault = vault(MemoryStorage::new());
        let pending = block_on(vault.store_payload("a")).unwrap();
        assert!(vault.is_held(&pending));

        assert_eq!(block_on(vault.prune_except(&HashSet::new())), 0);
        assert_eq!(block_on(vault.resolve(&pending)).as_deref(), Some("a"));

        vault.release(&pending);
        assert_eq!(block_on(vault.prune_except(&HashSet::new())), 1);
        assert!(block_on(vault.resolve(&pending)).is_none());
    }

    #[test]
    fn test_eviction_skips_held_references() {
        let vault = vault(MemoryStorage::with_capacity(120));
        let held = block_on(vault.store_payload("0123456789")).unwrap();
        let committed = stored(&vault, "0123456789");

        let third = block_on(vault.store_payload("0123456789")).unwrap();
        assert_eq!(block_on(vault.references()).unwrap(), vec![held.clone(), third]);

        // Nothing unheld is left to evict.
        assert_eq!(block_on(vault.store_payload("0123456789")), None);
        assert!(block_on(vault.resolve(&held)).is_some());
        assert!(block_on(vault.resolve(&committed)).is_none());
    }

    #[test]
    fn test_remove_releases() {
        let vault = vault(MemoryStorage::new());
        let reference = block_on(vault.store_payload("a")).unwrap();
        block_on(vault.remove(&reference));
        assert!(!vault.is_held(&reference));
        assert!(block_on(vault.resolve(&reference)).is_none());
    }

    #[test]
    fn test_clones_share_held_references() {
        let vault = vault(MemoryStorage::new());
        let other = vault.clone();
        let reference = block_on(vault.store_payload("a")).unwrap();
        assert!(other.is_held(&reference));
        other.release(&reference);
        assert!(!vault.is_held(&reference));
    }
}
