//! Connection Module
//!
//! This module manages individual client connections to skv.
//! Each client connection is handled by its own async task, so a slow or
//! idle client never holds up anyone else.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Server accept loop                      │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ spawn task per connection
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read line   │───>│ Decode      │───>│ Dispatch    │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │         ▲                                     │             │
//! │         │                                     ▼             │
//! │         │                            ┌─────────────┐        │
//! │         └────────────────────────────│ Write reply │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Strict ordering**: one reply per request, written before the next
//!   request is read
//! - **Bounded reads**: a per-connection byte budget
//! - **Idle eviction**: connections with no traffic are dropped
//! - **Shutdown aware**: the server stop signal closes every connection
//! - **Statistics**: Tracks connection and command metrics

pub mod handler;

// Re-export commonly used types
pub use handler::{
    handle_connection, ConnectionError, ConnectionHandler, ConnectionStats, SessionLimits,
    DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_READ_BYTES,
};
