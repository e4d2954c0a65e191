//! Mutex-Guarded Key-Value Store
//!
//! The store is the single piece of shared mutable state in skv: one
//! `HashMap<String, String>` behind one exclusive lock. Every read and every
//! write takes the same lock, so at most one operation touches the map at a
//! time.
//!
//! ## Lifecycle
//!
//! ```text
//!   Store::new() ──> set / get / delete ... ──> stop() ──> StorageError::Stopped
//! ```
//!
//! `stop` drops the map. Every later operation fails with
//! [`StorageError::Stopped`]; calling `stop` again is harmless.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors returned by the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store was stopped and no longer holds any data
    #[error("store is stopped")]
    Stopped,

    /// A thread panicked while holding the lock
    #[error("store lock poisoned")]
    Poisoned,
}

/// Counters describing store traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: usize,
    pub sets: u64,
    pub gets: u64,
    pub deletes: u64,
}

/// The in-memory key-value store.
///
/// Designed to be wrapped in an `Arc` and shared across all connection
/// handlers.
///
/// # Example
///
/// ```
/// use skv::storage::Store;
///
/// let store = Store::new();
/// store.set("name".to_string(), "Ariz".to_string()).unwrap();
/// assert_eq!(store.get("name").unwrap(), Some("Ariz".to_string()));
///
/// store.stop();
/// assert!(store.get("name").is_err());
/// ```
#[derive(Debug)]
pub struct Store {
    /// `None` once the store is stopped
    data: Mutex<Option<HashMap<String, String>>>,

    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Some(HashMap::new())),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<HashMap<String, String>>>, StorageError> {
        self.data.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&self, key: String, value: String) -> Result<(), StorageError> {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.lock()?;
        let data = guard.as_mut().ok_or(StorageError::Stopped)?;
        data.insert(key, value);
        Ok(())
    }

    /// Returns the value stored under `key`, or `None` if it is absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        let guard = self.lock()?;
        let data = guard.as_ref().ok_or(StorageError::Stopped)?;
        Ok(data.get(key).cloned())
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.lock()?;
        let data = guard.as_mut().ok_or(StorageError::Stopped)?;
        data.remove(key);
        Ok(())
    }

    /// Drops all data and invalidates the store.
    pub fn stop(&self) {
        // recover the map from a poisoned lock; it is being discarded anyway
        let mut guard = self.data.lock().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }

    /// Returns `true` once [`Store::stop`] has run.
    pub fn is_stopped(&self) -> bool {
        match self.data.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }

    /// Number of keys currently stored (zero once stopped).
    pub fn len(&self) -> usize {
        self.lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len(),
            sets: self.set_count.load(Ordering::Relaxed),
            gets: self.get_count.load(Ordering::Relaxed),
            deletes: self.del_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_get() {
        let store = Store::new();

        store.set("key".into(), "value".into()).unwrap();
        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = Store::new();
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_overwrite() {
        let store = Store::new();

        store.set("key".into(), "one".into()).unwrap();
        store.set("key".into(), "two".into()).unwrap();
        assert_eq!(store.get("key").unwrap(), Some("two".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = Store::new();

        store.set("key".into(), "value".into()).unwrap();
        store.delete("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);

        // deleting again is fine
        store.delete("key").unwrap();
    }

    #[test]
    fn test_empty_value_is_distinct_in_store() {
        let store = Store::new();

        store.set("key".into(), String::new()).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_stop_invalidates() {
        let store = Store::new();
        store.set("key".into(), "value".into()).unwrap();

        store.stop();
        assert!(store.is_stopped());
        assert_eq!(store.get("key"), Err(StorageError::Stopped));
        assert_eq!(
            store.set("a".into(), "b".into()),
            Err(StorageError::Stopped)
        );
        assert_eq!(store.delete("key"), Err(StorageError::Stopped));
        assert!(store.is_empty());

        store.stop();
        assert!(store.is_stopped());
    }

    #[test]
    fn test_stats() {
        let store = Store::new();
        store.set("a".into(), "1".into()).unwrap();
        store.set("b".into(), "2".into()).unwrap();
        store.get("a").unwrap();
        store.delete("b").unwrap();

        let stats = store.stats();
        assert_eq!(stats.keys, 1);
        assert_eq!(stats.sets, 2);
        assert_eq!(stats.gets, 1);
        assert_eq!(stats.deletes, 1);
    }

    #[test]
    fn test_concurrent_disjoint_writers() {
        let store = Arc::new(Store::new());
        let mut handles = vec![];

        for t in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    store
                        .set(format!("t{}:k{}", t, i), format!("{}", i))
                        .unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8 * 500);
        assert_eq!(store.get("t3:k499").unwrap(), Some("499".to_string()));
    }
}
