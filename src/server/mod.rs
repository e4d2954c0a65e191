//! Server Module
//!
//! This module owns the network side of skv: the listening socket, the
//! accept loop that spawns a task per connection, and the graceful stop
//! that drains every connection before the backend is released.
//!
//! ## Shutdown Order
//!
//! ```text
//!   external stop (Ctrl+C / SIGTERM)
//!        │
//!        ▼
//!   Server::stop ──> listener closed
//!        │      ──> stop signal fired ──> every ConnectionHandler closes
//!        │
//!        ▼
//!   wait until no handler is running
//!        │
//!        ▼
//!   Backend::stop
//! ```

pub mod listener;
pub mod shutdown;

// Re-export commonly used types
pub use listener::{Server, ServerConfig, ServerError, DEFAULT_ADDR};
pub use shutdown::{InFlight, InFlightGuard, Shutdown, ShutdownTrigger};
