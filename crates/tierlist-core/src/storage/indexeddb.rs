//! IndexedDB blob store for WebAssembly.
//!
//! Uses the browser's IndexedDB, which offers far more room for image
//! payloads than `localStorage`.

use super::{BlobStore, BoxFuture, StorageError, StorageResult};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

const DB_NAME: &str = "tierlist";
const DB_VERSION: u32 = 1;
const STORE_NAME: &str = "blobs";
const QUOTA_EXCEEDED: &str = "QuotaExceededError";

/// IndexedDB-based storage for WebAssembly.
///
/// Note: This is intentionally not Send/Sync since WASM is single-threaded
/// and IndexedDB handles are not thread-safe.
pub struct IndexedDbStorage {
    /// Cached database connection.
    db: Rc<RefCell<Option<IdbDatabase>>>,
}

impl IndexedDbStorage {
    /// Create a new IndexedDB storage.
    ///
    /// Note: The actual database connection is established lazily on first use.
    pub fn new() -> Self {
        Self {
            db: Rc::new(RefCell::new(None)),
        }
    }

    /// Open or create the database, returning a handle.
    async fn get_db(&self) -> StorageResult<IdbDatabase> {
        if let Some(db) = self.db.borrow().as_ref() {
            return Ok(db.clone());
        }

        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;

        let idb_factory = window
            .indexed_db()
            .map_err(|e| StorageError::Other(format!("IndexedDB error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("IndexedDB not available".to_string()))?;

        let open_request = idb_factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(|e| StorageError::Other(format!("Failed to open DB: {:?}", e)))?;

        let onupgrade = Closure::once(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
            let Some(target) = event.target() else { return };
            let request: IdbRequest = target.unchecked_into();
            let Ok(result) = request.result() else { return };
            let db: IdbDatabase = result.unchecked_into();

            if !db.object_store_names().contains(STORE_NAME) {
                if let Err(e) = db.create_object_store(STORE_NAME) {
                    log::error!("Failed to create object store: {:?}", e);
                }
            }
        }) as Box<dyn FnOnce(_)>);

        open_request.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db = await_idb_request::<IdbDatabase>(&open_request).await?;
        *self.db.borrow_mut() = Some(db.clone());

        Ok(db)
    }

    fn get_store(
        &self,
        db: &IdbDatabase,
        mode: IdbTransactionMode,
    ) -> StorageResult<IdbObjectStore> {
        let transaction = db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(|e| StorageError::Other(format!("Transaction error: {:?}", e)))?;

        transaction
            .object_store(STORE_NAME)
            .map_err(|e| StorageError::Other(format!("Store error: {:?}", e)))
    }
}

impl Default for IndexedDbStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for IndexedDbStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;

            let request = store
                .get(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Get error: {:?}", e)))?;

            let result = await_idb_request::<JsValue>(&request).await?;

            if result.is_undefined() || result.is_null() {
                return Err(StorageError::NotFound(key));
            }

            result
                .as_string()
                .ok_or_else(|| StorageError::Serialization("Invalid stored data".to_string()))
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;

            let request = store
                .put_with_key(&JsValue::from_str(&value), &JsValue::from_str(&key))
                .map_err(|e| map_dom_error("Put", e))?;

            await_idb_request::<JsValue>(&request).await?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;

            let request = store
                .delete(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Other(format!("Delete error: {:?}", e)))?;

            await_idb_request::<JsValue>(&request).await?;
            Ok(())
        })
    }

    fn list_prefix(&self, prefix: &str) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let prefix = prefix.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;

            let request = store
                .get_all_keys()
                .map_err(|e| StorageError::Other(format!("GetAllKeys error: {:?}", e)))?;

            let result = await_idb_request::<js_sys::Array>(&request).await?;

            let mut keys = Vec::new();
            for i in 0..result.length() {
                if let Some(key) = result.get(i).as_string() {
                    if key.starts_with(&prefix) {
                        keys.push(key);
                    }
                }
            }
            Ok(keys)
        })
    }
}

/// Map a thrown `DOMException` (or its name) to a storage error.
fn map_dom_error(op: &str, e: JsValue) -> StorageError {
    let name = e
        .dyn_ref::<web_sys::DomException>()
        .map(|ex| ex.name())
        .or_else(|| e.as_string());
    match name.as_deref() {
        Some(QUOTA_EXCEEDED) => StorageError::QuotaExceeded,
        _ => StorageError::Other(format!("{} error: {:?}", op, e)),
    }
}

/// Helper to await an IndexedDB request using a Promise.
async fn await_idb_request<T: JsCast>(request: &IdbRequest) -> StorageResult<T> {
    use wasm_bindgen_futures::JsFuture;

    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let onsuccess = Closure::once(Box::new(move |event: web_sys::Event| {
            let result = event
                .target()
                .map(|t| t.unchecked_into::<IdbRequest>())
                .and_then(|r| r.result().ok())
                .unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &result);
        }) as Box<dyn FnOnce(_)>);

        let onerror = Closure::once(Box::new(move |event: web_sys::Event| {
            let name = event
                .target()
                .map(|t| t.unchecked_into::<IdbRequest>())
                .and_then(|r| r.error().ok().flatten())
                .map(|ex| ex.name())
                .unwrap_or_else(|| "IndexedDB request failed".to_string());
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&name));
        }) as Box<dyn FnOnce(_)>);

        request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        request.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        onsuccess.forget();
        onerror.forget();
    });

    JsFuture::from(promise)
        .await
        .map_err(|e| map_dom_error("IndexedDB request", e))?
        .dyn_into::<T>()
        .map_err(|_| StorageError::Other("Type conversion failed".to_string()))
}
