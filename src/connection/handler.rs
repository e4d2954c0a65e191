//! Connection Handler Module
//!
//! This module handles individual client connections to skv.
//! Each client gets its own handler task that runs in a loop,
//! reading request lines and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects, idle deadline armed
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  Reading     one line        │──┐
//!    │     │                        │  │ EOF, budget spent,
//!    │     ▼                        │  │ I/O error, deadline,
//!    │  Processing  decode+dispatch │  │ shutdown signal
//!    │     │                        │  │
//!    │     ▼                        │  │
//!    │  Writing     reply, renew    │──┤
//!    │     │        deadline        │  │
//!    │     └──> back to Reading     │  │
//!    └──────────────────────────────┘  │
//!        ┌─────────────────────────────┘
//!        ▼
//! 3. Closed: socket dropped, handler task ends
//! ```
//!
//! ## Read Budget
//!
//! The socket's read half is wrapped in `take(max_read_bytes)`. The budget
//! covers the whole connection, not a single line: once it is spent the
//! reader reports end-of-stream and the connection closes.
//!
//! ## Deadline
//!
//! Every read and write races the idle deadline. Only a successful reply
//! write pushes it forward, so a peer that neither sends a request nor
//! receives a reply within the window is dropped without a reply.

use crate::commands::CommandHandler;
use crate::protocol::{decode_bytes, Reply};
use crate::server::Shutdown;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter, Take};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

/// Default idle window before an inactive connection is dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of bytes a connection may send over its lifetime
pub const DEFAULT_MAX_READ_BYTES: u64 = 1000;

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Inactivity window; renewed after every reply
    pub idle_timeout: Duration,
    /// Total bytes read from the peer before the stream counts as ended
    pub max_read_bytes: u64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }
}

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Owns both halves of the socket; dropping the handler closes it.
pub struct ConnectionHandler {
    /// Budgeted, buffered read half
    reader: BufReader<Take<OwnedReadHalf>>,

    /// Buffered write half
    writer: BufWriter<OwnedWriteHalf>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for the line being read
    line: Vec<u8>,

    /// The command dispatcher
    command_handler: CommandHandler,

    /// This connection's view of the server stop signal
    shutdown: Shutdown,

    idle_timeout: Duration,

    /// When the connection is dropped if nothing is written before then
    deadline: Instant,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    /// Creates a new connection handler and arms its idle deadline.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The dispatcher for decoded commands
    /// * `shutdown` - Stop signal subscription owned by this connection
    /// * `limits` - Idle window and read budget
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        shutdown: Shutdown,
        limits: SessionLimits,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        let (read_half, write_half) = stream.into_split();

        Self {
            reader: BufReader::new(read_half.take(limits.max_read_bytes)),
            writer: BufWriter::new(write_half),
            addr,
            line: Vec::new(),
            command_handler,
            shutdown,
            idle_timeout: limits.idle_timeout,
            deadline: Instant::now() + limits.idle_timeout,
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns `Ok(())` when the peer ends the stream (or the read budget
    /// runs out) and an error for every other way the connection ends.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Handling connection");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => debug!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Cancelled) => {
                debug!(client = %self.addr, "Connection closed by shutdown")
            }
            Err(ConnectionError::IdleTimeout) => {
                debug!(client = %self.addr, "Connection idle, closing")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-decode-dispatch-write loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        while self.read_line().await? {
            if self.line.is_empty() {
                continue;
            }

            let reply = match decode_bytes(&self.line) {
                Ok(command) => {
                    let reply = self.command_handler.execute(&self.shutdown, command);
                    self.stats.command_processed();
                    reply
                }
                Err(e) => {
                    warn!(client = %self.addr, error = %e, "Failed to decode command");
                    Reply::decode_error(&e)
                }
            };

            self.send_reply(&reply).await?;
        }

        if self.reader.get_ref().limit() == 0 {
            debug!(client = %self.addr, "Read budget exhausted");
        }

        Ok(())
    }

    /// Reads the next line into `self.line`, without its `\n` or `\r\n`
    /// terminator.
    ///
    /// Returns `false` at end of stream. A final line cut short by the end of
    /// stream is still read.
    async fn read_line(&mut self) -> Result<bool, ConnectionError> {
        self.line.clear();

        let shutdown = &mut self.shutdown;
        let reader = &mut self.reader;
        let line = &mut self.line;

        let n = tokio::select! {
            biased;
            _ = shutdown.recv() => return Err(ConnectionError::Cancelled),
            _ = time::sleep_until(self.deadline) => return Err(ConnectionError::IdleTimeout),
            res = reader.read_until(b'\n', line) => res?,
        };

        if n == 0 {
            return Ok(false);
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read line");

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        }
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }

        Ok(true)
    }

    /// Sends a reply to the client and renews the idle deadline.
    ///
    /// A failed write ends the connection; the client is expected to retry
    /// on a new one.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();

        let shutdown = &mut self.shutdown;
        let writer = &mut self.writer;
        let write = async {
            writer.write_all(&bytes).await?;
            writer.flush().await
        };

        tokio::select! {
            biased;
            _ = shutdown.recv() => return Err(ConnectionError::Cancelled),
            _ = time::sleep_until(self.deadline) => return Err(ConnectionError::IdleTimeout),
            res = write => res?,
        }

        self.deadline = Instant::now() + self.idle_timeout;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent reply");
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Nothing was written within the idle window
    #[error("idle timeout")]
    IdleTimeout,

    /// The server is shutting down
    #[error("connection cancelled")]
    Cancelled,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    shutdown: Shutdown,
    limits: SessionLimits,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, shutdown, limits, stats);
    // outcome is already logged by run()
    let _ = handler.run().await;
}
