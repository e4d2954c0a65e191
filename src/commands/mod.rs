//! Command Module
//!
//! This module implements the dispatch layer between the wire protocol and
//! the storage backend.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Decoder   │  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │ Backend trait
//!          ▼
//! ┌─────────────────┐
//! │  StoreBackend   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `set:<key>:<value>`
//! - `get:<key>`
//! - `del:<key>`

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
