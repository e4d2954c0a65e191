//! Shutdown Coordination
//!
//! Two small pieces hold the graceful-stop protocol together:
//!
//! - [`ShutdownTrigger`] / [`Shutdown`]: a broadcast stop signal built on a
//!   `tokio::sync::watch` channel. The server owns the trigger; the accept
//!   loop and every connection handler own a `Shutdown` subscribed to it.
//! - [`InFlight`]: a counter of running workers. Each worker holds an
//!   [`InFlightGuard`] for its whole lifetime, and the server waits for the
//!   count to reach zero before releasing the backend.
//!
//! ```text
//!   Server::stop()
//!        │ trigger.fire()
//!        ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ accept loop  │   │  handler #1  │   │  handler #N  │
//!   │  Shutdown    │   │  Shutdown    │   │  Shutdown    │
//!   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!          │ drop guard       │ drop guard       │ drop guard
//!          ▼                  ▼                  ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │           InFlight (count → 0, notify)               │
//!   └──────────────────────────────────────────────────────┘
//!        │ wait_idle() returns
//!        ▼
//!   backend.stop()
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// The sending side of the stop signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Creates an un-fired trigger.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns a new listener for this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }

    /// Fires the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener for the stop signal.
///
/// Dropping the [`ShutdownTrigger`] counts as firing it, so a worker never
/// outlives the server that spawned it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns `true` once the signal has fired.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Waits until the signal fires.
    pub async fn recv(&mut self) {
        // an Err means the trigger was dropped
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Tracks the number of running workers.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    drained: Notify,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a worker. The worker counts as running until the guard drops.
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of workers currently running.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until no worker is running.
    pub async fn wait_idle(&self) {
        loop {
            // registered before the check, so a wakeup between the two is kept
            let notified = self.drained.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one running worker; see [`InFlight::enter`].
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.tracker.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.drained.notify_waiters();
        }
    }
}
