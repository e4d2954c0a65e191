//! # skv - A Small In-Memory Key-Value Server
//!
//! skv keeps a single string-to-string map in memory and serves it over a
//! line-oriented text protocol on TCP. It shows the moving parts of a
//! network service: a wire codec, a dispatcher, per-connection tasks with
//! deadlines and read budgets, and a graceful stop that drains every
//! connection before the store is released.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                skv                                  │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │   Server    │───>│ Connection  │───>│  Command    │              │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │              │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘              │
//! │         │                  │                  │ Backend trait       │
//! │         │           ┌──────┴──────┐           ▼                     │
//! │         │           │  Line Codec │    ┌─────────────┐              │
//! │         │           │ decode/enc. │    │StoreBackend │              │
//! │         │           └─────────────┘    └──────┬──────┘              │
//! │         │                                     ▼                     │
//! │         │ stop signal              ┌───────────────────┐            │
//! │         └─────────────────────────>│ Store (Mutex Map) │            │
//! │                                    └───────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use skv::server::{Server, ServerConfig};
//! use skv::storage::StoreBackend;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(StoreBackend::default());
//!     let server = Arc::new(Server::bind(backend, ServerConfig::default()).await?);
//!
//!     let listening = Arc::clone(&server);
//!     tokio::spawn(async move { listening.listen().await });
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! | Request          | Reply                         |
//! |------------------|-------------------------------|
//! | `set:<k>:<v>`    | `ok`                          |
//! | `get:<k>`        | `ok:<v>`, or `ok:null`        |
//! | `del:<k>`        | `ok`                          |
//! | malformed line   | `err:cmd_decode:<reason>`     |
//! | backend failure  | `err:cmd_failed:command failed` |
//!
//! Every line ends in `\r\n` (requests may use a bare `\n`).
//!
//! ### Known limitations
//!
//! - A stored empty string and a missing key both read back as `ok:null`.
//! - `:` cannot appear in keys or values; there is no escaping.
//!
//! ## Module Overview
//!
//! - [`protocol`]: request decoding and reply encoding
//! - [`storage`]: the mutex-guarded store and the backend adapter
//! - [`commands`]: command dispatch
//! - [`connection`]: per-connection request loop
//! - [`server`]: listener lifecycle and shutdown coordination
//! - [`config`]: flags and environment

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats, SessionLimits};
pub use protocol::{decode, decode_bytes, Command, DecodeError, Operation, Reply, ReplyKind};
pub use server::{Server, ServerConfig, ServerError};
pub use storage::{Backend, BackendError, StorageError, Store, StoreBackend};

/// Version of skv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
