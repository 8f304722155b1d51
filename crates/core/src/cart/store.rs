//! Durable key/value storage for cart snapshots.
//!
//! The cart rewrites its whole snapshot after every mutation, so a store only
//! needs whole-value reads and writes keyed by a namespace string.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Errors raised by a [`SnapshotStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing storage cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Filesystem operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whole-value key/value storage used to persist client state.
///
/// Implementations must be usable from a single thread without external
/// locking; `Send + Sync` is required so stores can move onto worker threads.
pub trait SnapshotStore: Send + Sync {
    /// Read the value under `key`, or `None` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store.
///
/// Clones share the same entries, which models several cart instances (for
/// example two browser tabs) backed by one durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Store whose writes and removes can be made to fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    /// Fail every `write` while set.
    pub(crate) failing: std::sync::atomic::AtomicBool,
    /// Fail every `remove` while set.
    pub(crate) failing_removes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl SnapshotStore for FlakyStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_removes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.remove(key)
    }
}
