//! TCP Server Lifecycle
//!
//! [`Server`] owns the listening socket, spawns one task per accepted
//! connection and coordinates graceful shutdown.
//!
//! ```text
//!   bind() ──> Listening ──stop()──> Draining ──> Stopped
//!                 │                      │
//!        accept + spawn handler   fire stop signal,
//!                                 close listener,
//!                                 wait for handlers,
//!                                 stop backend
//! ```
//!
//! The backend is only stopped once every connection task has exited, so no
//! handler can call into a stopped backend.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats, SessionLimits};
use crate::server::shutdown::{InFlight, ShutdownTrigger};
use crate::storage::Backend;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default address the server binds to
pub const DEFAULT_ADDR: &str = "0.0.0.0:2303";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP address to listen on
    pub addr: String,
    /// Inactivity window per connection
    pub idle_timeout: Duration,
    /// Bytes a connection may send over its lifetime
    pub max_read_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            addr: DEFAULT_ADDR.to_string(),
            idle_timeout: limits.idle_timeout,
            max_read_bytes: limits.max_read_bytes,
        }
    }
}

impl ServerConfig {
    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            idle_timeout: self.idle_timeout,
            max_read_bytes: self.max_read_bytes,
        }
    }
}

/// Errors raised while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A skv TCP server.
///
/// # Example
///
/// ```ignore
/// use skv::server::{Server, ServerConfig};
/// use skv::storage::StoreBackend;
/// use std::sync::Arc;
///
/// let server = Arc::new(Server::bind(Arc::new(StoreBackend::default()), ServerConfig::default()).await?);
///
/// let listening = Arc::clone(&server);
/// tokio::spawn(async move { listening.listen().await });
///
/// // ... later
/// server.stop().await;
/// ```
pub struct Server {
    /// Unique identity, used only in logs
    id: String,

    local_addr: SocketAddr,

    /// Taken by the accept loop; `None` once listening or stopped
    listener: Mutex<Option<TcpListener>>,

    backend: Arc<dyn Backend>,

    limits: SessionLimits,

    /// Stop signal shared by the accept loop and every handler
    trigger: ShutdownTrigger,

    /// The accept loop and every live handler
    in_flight: Arc<InFlight>,

    stopped: AtomicBool,

    stats: Arc<ConnectionStats>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("id", &self.id)
            .field("local_addr", &self.local_addr)
            .field("in_flight", &self.in_flight.count())
            .field("stopped", &self.stopped.load(Ordering::Relaxed))
            .finish()
    }
}

impl Server {
    /// Binds the listening socket.
    ///
    /// A bind failure is returned as-is; the caller decides whether to give up.
    pub async fn bind(backend: Arc<dyn Backend>, config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let id = Uuid::new_v4().to_string();

        debug!(server_id = %id, addr = %local_addr, "Server bound");

        Ok(Self {
            id,
            local_addr,
            listener: Mutex::new(Some(listener)),
            backend,
            limits: config.limits(),
            trigger: ShutdownTrigger::new(),
            in_flight: Arc::new(InFlight::new()),
            stopped: AtomicBool::new(false),
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    /// The server's unique identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Accepts connections until the server is stopped.
    ///
    /// Each connection is served by its own task. Accept errors are logged
    /// and the loop keeps going. Returns immediately if the server is
    /// already listening elsewhere or has been stopped.
    pub async fn listen(&self) {
        let (listener, _running) = {
            let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.take() {
                Some(listener) => (listener, self.in_flight.enter()),
                None => {
                    warn!(server_id = %self.id, "Listener unavailable, not accepting");
                    return;
                }
            }
        };

        let mut shutdown = self.trigger.subscribe();
        info!(server_id = %self.id, addr = %self.local_addr, "Listening for connections");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                res = listener.accept() => res,
            };

            match accepted {
                Ok((stream, addr)) => {
                    if shutdown.is_shutdown() {
                        break;
                    }

                    let running = self.in_flight.enter();
                    let handler = CommandHandler::new(Arc::clone(&self.backend));
                    let conn_shutdown = self.trigger.subscribe();
                    let limits = self.limits;
                    let stats = Arc::clone(&self.stats);

                    tokio::spawn(async move {
                        handle_connection(stream, addr, handler, conn_shutdown, limits, stats).await;
                        drop(running);
                    });
                }
                Err(e) => {
                    if shutdown.is_shutdown() {
                        break;
                    }
                    error!(server_id = %self.id, error = %e, "Failed to accept connection");
                }
            }
        }

        drop(listener);
        debug!(server_id = %self.id, "Listener closed");
    }

    /// Shuts the server down gracefully.
    ///
    /// Closes the listener, signals every connection to close, waits until
    /// all of them have exited and only then stops the backend. Only the
    /// first call does anything.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(server_id = %self.id, "Stopping server");

        // never taken by an accept loop, close it here
        let unused = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(unused);

        self.trigger.fire();
        self.in_flight.wait_idle().await;

        if let Err(e) = self.backend.stop() {
            error!(server_id = %self.id, error = %e, "Failed to stop backend");
        }

        info!(server_id = %self.id, "Server stopped");
    }
}
