//! Command Dispatcher
//!
//! Maps a decoded [`Command`] onto exactly one backend call and turns the
//! outcome into a [`Reply`].
//!
//! ## Mapping
//!
//! | Command         | Backend call          | Reply on success         |
//! |-----------------|-----------------------|--------------------------|
//! | `set:<k>:<v>`   | `set(k, v)`           | `ok`                     |
//! | `get:<k>`       | `get(k)`              | `ok:<v>` (`ok:null` if absent) |
//! | `del:<k>`       | `delete(k)`           | `ok`                     |
//!
//! Any backend failure, cancellation included, becomes
//! `err:cmd_failed:command failed`. The cause is logged, never sent to the
//! client. Nothing is retried.

use crate::protocol::{Command, Operation, Reply};
use crate::server::Shutdown;
use crate::storage::{Backend, BackendError};
use std::sync::Arc;
use tracing::error;

/// Dispatches commands to a backend.
///
/// Cheap to clone; every connection handler owns one.
#[derive(Clone)]
pub struct CommandHandler {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler").finish_non_exhaustive()
    }
}

impl CommandHandler {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Executes a command and returns the reply to send back.
    ///
    /// # Arguments
    ///
    /// * `scope` - The calling connection's shutdown scope
    /// * `command` - A decoded command; its arity is already checked
    pub fn execute(&self, scope: &Shutdown, command: Command) -> Reply {
        let operation = command.operation();

        match self.dispatch(scope, command) {
            Ok(reply) => reply,
            Err(e) => {
                error!(command = %operation, error = %e, "Failed to process command");
                Reply::command_failed()
            }
        }
    }

    fn dispatch(&self, scope: &Shutdown, command: Command) -> Result<Reply, BackendError> {
        let operation = command.operation();
        let mut args = command.into_args().into_iter();
        // arity was enforced by the decoder
        let mut next = || args.next().unwrap_or_default();

        match operation {
            Operation::Set => {
                let key = next();
                let value = next();
                self.backend.set(scope, key, value)?;
                Ok(Reply::ok_empty())
            }
            Operation::Get => {
                // a missing key reads as the empty string, which encodes as `null`
                let value = self.backend.get(scope, &next())?.unwrap_or_default();
                Ok(Reply::ok([value]))
            }
            Operation::Delete => {
                self.backend.delete(scope, &next())?;
                Ok(Reply::ok_empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode;
    use crate::server::ShutdownTrigger;
    use crate::storage::{StorageError, StoreBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_handler() -> (CommandHandler, ShutdownTrigger) {
        let backend: Arc<dyn Backend> = Arc::new(StoreBackend::default());
        (CommandHandler::new(backend), ShutdownTrigger::new())
    }

    fn run(handler: &CommandHandler, trigger: &ShutdownTrigger, line: &str) -> Reply {
        handler.execute(&trigger.subscribe(), decode(line).unwrap())
    }

    /// A backend whose every call fails, counting how often it was called.
    #[derive(Default)]
    struct FailingBackend {
        calls: AtomicUsize,
    }

    impl FailingBackend {
        fn fail(&self) -> BackendError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            BackendError::Storage(StorageError::Stopped)
        }
    }

    impl Backend for FailingBackend {
        fn set(&self, _: &Shutdown, _: String, _: String) -> Result<(), BackendError> {
            Err(self.fail())
        }

        fn get(&self, _: &Shutdown, _: &str) -> Result<Option<String>, BackendError> {
            Err(self.fail())
        }

        fn delete(&self, _: &Shutdown, _: &str) -> Result<(), BackendError> {
            Err(self.fail())
        }

        fn stop(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn test_set_get() {
        let (handler, trigger) = create_handler();

        assert_eq!(run(&handler, &trigger, "set:key:value"), Reply::ok_empty());
        assert_eq!(run(&handler, &trigger, "get:key"), Reply::ok(["value"]));
    }

    #[test]
    fn test_get_nonexistent_encodes_null() {
        let (handler, trigger) = create_handler();

        let reply = run(&handler, &trigger, "get:nonexistent");
        assert_eq!(reply, Reply::ok([""]));
        assert_eq!(&reply.serialize()[..], b"ok:null\r\n");
    }

    #[test]
    fn test_empty_value_matches_not_found_on_wire() {
        let (handler, trigger) = create_handler();

        run(&handler, &trigger, "set:key:");
        let present = run(&handler, &trigger, "get:key").serialize();
        let absent = run(&handler, &trigger, "get:other").serialize();
        assert_eq!(present, absent);
    }

    #[test]
    fn test_del() {
        let (handler, trigger) = create_handler();

        run(&handler, &trigger, "set:key:value");
        assert_eq!(run(&handler, &trigger, "del:key"), Reply::ok_empty());
        assert_eq!(run(&handler, &trigger, "get:key"), Reply::ok([""]));
    }

    #[test]
    fn test_backend_failure_is_generic() {
        let backend = Arc::new(FailingBackend::default());
        let handler = CommandHandler::new(backend.clone());
        let trigger = ShutdownTrigger::new();

        for line in ["set:a:b", "get:a", "del:a"] {
            let reply = run(&handler, &trigger, line);
            assert_eq!(reply, Reply::command_failed());
            // the storage cause stays off the wire
            assert!(!reply.to_string().contains("stopped"));
        }

        // one backend call per command, no retries
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancelled_scope_fails_command() {
        let (handler, trigger) = create_handler();
        let scope = trigger.subscribe();
        trigger.fire();

        let reply = handler.execute(&scope, decode("set:a:b").unwrap());
        assert_eq!(reply, Reply::command_failed());
    }
}
