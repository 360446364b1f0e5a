use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use thiserror::Error;

/// Failures surfaced by a key-value backend. Adapters map `NotFound` to
/// "nothing stored yet"; everything else is a `Storage` failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("nothing stored under {key}")]
    NotFound { key: String },
    /// Backend refused the operation (quota, permissions, I/O).
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Flat string-keyed byte storage. The task list, the reset marker and the
/// theme each live under their own key, so a write to one never touches
/// another.
pub trait KeyValueStore {
    /// Replaces whatever is stored under `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Map-backed store used as a test double. Clones share state,
/// so a test can keep a handle, inspect raw entries, and inject quota
/// failures while a `TaskStore` owns another clone.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    full: Arc<AtomicBool>,
    full_keys: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every later `put`, as a browser does once its storage quota
    /// is exhausted.
    pub fn set_fail_writes(&self, fail: bool) {
        self.full.store(fail, Ordering::SeqCst);
    }

    /// Rejects later writes to `key` only. A large task list can hit the
    /// quota while the short reset marker still fits.
    pub fn fail_writes_to(&self, key: &str) {
        if let Ok(mut keys) = self.full_keys.lock() {
            keys.insert(key.to_string());
        }
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn rejects(&self, key: &str) -> bool {
        self.full.load(Ordering::SeqCst)
            || self
                .full_keys
                .lock()
                .map(|keys| keys.contains(key))
                .unwrap_or(true)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StoreError> {
        self.entries.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })
    }
}

impl KeyValueStore for InMemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.rejects(key) {
            return Err(StoreError::Storage {
                reason: format!("quota exceeded writing {key}"),
            });
        }
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.lock()?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
