//! Cancellation-Aware Backend
//!
//! The [`Backend`] trait is the seam between the protocol layer and storage.
//! The command dispatcher only ever talks to a `Backend`; [`StoreBackend`] is
//! the production implementation over [`Store`].
//!
//! Every data operation takes the caller's [`Shutdown`] scope. If the scope
//! has already fired, the call fails with [`BackendError::Cancelled`] without
//! touching the store.

use crate::server::Shutdown;
use crate::storage::engine::{StorageError, Store};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by a backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The caller's scope was cancelled before the call ran
    #[error("operation cancelled")]
    Cancelled,

    /// The underlying store failed
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

/// The storage contract consumed by the dispatcher.
///
/// Implementations must be safe to call from many connection tasks at once.
pub trait Backend: Send + Sync + 'static {
    /// Sets `key` to `value`.
    fn set(&self, scope: &Shutdown, key: String, value: String) -> Result<(), BackendError>;

    /// Looks up `key`, returning `None` when it is not present.
    fn get(&self, scope: &Shutdown, key: &str) -> Result<Option<String>, BackendError>;

    /// Removes `key`.
    fn delete(&self, scope: &Shutdown, key: &str) -> Result<(), BackendError>;

    /// Releases the backend. Called once, after every connection has exited.
    fn stop(&self) -> Result<(), BackendError>;
}

/// A [`Backend`] over the in-memory [`Store`].
#[derive(Debug, Clone)]
pub struct StoreBackend {
    store: Arc<Store>,
}

impl StoreBackend {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::new(Arc::new(Store::new()))
    }
}

fn check(scope: &Shutdown) -> Result<(), BackendError> {
    if scope.is_shutdown() {
        return Err(BackendError::Cancelled);
    }
    Ok(())
}

impl Backend for StoreBackend {
    fn set(&self, scope: &Shutdown, key: String, value: String) -> Result<(), BackendError> {
        check(scope)?;
        Ok(self.store.set(key, value)?)
    }

    fn get(&self, scope: &Shutdown, key: &str) -> Result<Option<String>, BackendError> {
        check(scope)?;
        Ok(self.store.get(key)?)
    }

    fn delete(&self, scope: &Shutdown, key: &str) -> Result<(), BackendError> {
        check(scope)?;
        Ok(self.store.delete(key)?)
    }

    fn stop(&self) -> Result<(), BackendError> {
        self.store.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ShutdownTrigger;

    #[test]
    fn test_operations_pass_through() {
        let trigger = ShutdownTrigger::new();
        let scope = trigger.subscribe();
        let backend = StoreBackend::default();

        backend.set(&scope, "k".into(), "v".into()).unwrap();
        assert_eq!(backend.get(&scope, "k").unwrap(), Some("v".to_string()));

        backend.delete(&scope, "k").unwrap();
        assert_eq!(backend.get(&scope, "k").unwrap(), None);
    }

    #[test]
    fn test_cancelled_scope_skips_store() {
        let trigger = ShutdownTrigger::new();
        let scope = trigger.subscribe();
        let backend = StoreBackend::default();
        backend.set(&scope, "k".into(), "v".into()).unwrap();

        trigger.fire();

        assert_eq!(
            backend.set(&scope, "k".into(), "other".into()),
            Err(BackendError::Cancelled)
        );
        assert_eq!(backend.get(&scope, "k"), Err(BackendError::Cancelled));
        assert_eq!(backend.delete(&scope, "k"), Err(BackendError::Cancelled));

        // the store itself was left alone
        assert_eq!(backend.store().get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_stop_invalidates_store() {
        let trigger = ShutdownTrigger::new();
        let scope = trigger.subscribe();
        let backend = StoreBackend::default();

        backend.stop().unwrap();
        assert!(backend.store().is_stopped());
        assert_eq!(
            backend.get(&scope, "k"),
            Err(BackendError::Storage(StorageError::Stopped))
        );
    }
}
