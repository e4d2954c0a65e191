//! Storage Module
//!
//! This module provides the storage side of skv: the mutex-guarded
//! [`Store`] and the cancellation-aware [`Backend`] adapter the protocol
//! layer calls into.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  CommandHandler (dispatcher)                │
//! └──────────────────────┬──────────────────────┘
//!                        │ Backend trait
//!                        ▼
//! ┌─────────────────────────────────────────────┐
//! │  StoreBackend   (checks Shutdown scope)     │
//! └──────────────────────┬──────────────────────┘
//!                        ▼
//! ┌─────────────────────────────────────────────┐
//! │  Store          Mutex<HashMap>              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use skv::server::ShutdownTrigger;
//! use skv::storage::{Backend, StoreBackend};
//!
//! let trigger = ShutdownTrigger::new();
//! let scope = trigger.subscribe();
//! let backend = StoreBackend::default();
//!
//! backend.set(&scope, "name".into(), "Ariz".into()).unwrap();
//! assert_eq!(backend.get(&scope, "name").unwrap(), Some("Ariz".to_string()));
//! ```

pub mod backend;
pub mod engine;

// Re-export commonly used types
pub use backend::{Backend, BackendError, StoreBackend};
pub use engine::{StorageError, StorageStats, Store};
