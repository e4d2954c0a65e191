//! Wire Protocol Data Types
//!
//! This module defines the structured forms of what travels over the wire:
//! a [`Command`] decoded from one request line, and a [`Reply`] encoded back
//! to the client.
//!
//! ## Protocol Format
//!
//! Requests and replies are single lines of colon-separated tokens:
//!
//! ```text
//! set:name:Ariz\r\n      ->  ok\r\n
//! get:name\r\n           ->  ok:Ariz\r\n
//! get:missing\r\n        ->  ok:null\r\n
//! del:name\r\n           ->  ok\r\n
//! bogus:x\r\n            ->  err:cmd_decode:unsupported command: bogus\r\n
//! ```
//!
//! There is no escaping, so a value containing `:` cannot be stored.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator appended to every reply
pub const CRLF: &[u8] = b"\r\n";

/// Separator between tokens of a request or reply
pub const DELIMITER: char = ':';

/// Placeholder written in place of empty arguments of an OK reply
pub const NULL_TOKEN: &str = "null";

/// Fixed error tokens carried as the first argument of an error reply.
pub mod error_token {
    /// The request line could not be decoded into a command.
    pub const DECODE: &str = "cmd_decode";
    /// The backend failed to execute a well-formed command.
    pub const COMMAND_FAILED: &str = "cmd_failed";
}

/// The operations a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `set:<key>:<value>`
    Set,
    /// `get:<key>`
    Get,
    /// `del:<key>`
    Delete,
}

impl Operation {
    /// Looks up an operation by its exact, case-sensitive wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "set" => Some(Operation::Set),
            "get" => Some(Operation::Get),
            "del" => Some(Operation::Delete),
            _ => None,
        }
    }

    /// The wire name of this operation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Get => "get",
            Operation::Delete => "del",
        }
    }

    /// Number of arguments the operation requires.
    pub fn arity(self) -> usize {
        match self {
            Operation::Set => 2,
            Operation::Get | Operation::Delete => 1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded client request.
///
/// The argument count always equals `operation.arity()`; the decoder refuses
/// to build a command otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    operation: Operation,
    args: Vec<String>,
}

impl Command {
    pub(crate) fn new(operation: Operation, args: Vec<String>) -> Self {
        debug_assert_eq!(args.len(), operation.arity());
        Self { operation, args }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Consumes the command, returning its arguments.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

/// Whether a reply reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Ok,
    Error,
}

impl ReplyKind {
    fn token(self) -> &'static str {
        match self {
            ReplyKind::Ok => "ok",
            ReplyKind::Error => "err",
        }
    }
}

/// A reply to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub args: Vec<String>,
}

impl Reply {
    /// Creates a successful reply carrying `args`.
    pub fn ok<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ReplyKind::Ok,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a successful reply with no arguments.
    pub fn ok_empty() -> Self {
        Self {
            kind: ReplyKind::Ok,
            args: Vec::new(),
        }
    }

    /// Creates an error reply of the form `err:<token>:<message>`.
    pub fn error(token: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Error,
            args: vec![token.to_string(), message.into()],
        }
    }

    /// Reply sent when a line fails to decode.
    pub fn decode_error(cause: impl fmt::Display) -> Self {
        Self::error(error_token::DECODE, cause.to_string())
    }

    /// Reply sent when the backend fails to run a command.
    pub fn command_failed() -> Self {
        Self::error(error_token::COMMAND_FAILED, "command failed")
    }

    /// Encodes the reply into its wire form.
    ///
    /// Empty arguments of an OK reply are written as `null`; error replies
    /// are written as given. The result always ends with CRLF.
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len_hint());
        self.serialize_into(&mut buf);
        buf.freeze()
    }

    /// Encodes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        buf.put_slice(self.kind.token().as_bytes());
        for arg in &self.args {
            buf.put_u8(DELIMITER as u8);
            let arg = match self.kind {
                ReplyKind::Ok if arg.is_empty() => NULL_TOKEN,
                _ => arg.as_str(),
            };
            buf.put_slice(arg.as_bytes());
        }
        buf.put_slice(CRLF);
    }

    fn encoded_len_hint(&self) -> usize {
        let args: usize = self
            .args
            .iter()
            .map(|a| a.len().max(NULL_TOKEN.len()) + 1)
            .sum();
        self.kind.token().len() + args + CRLF.len()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.serialize();
        let line = String::from_utf8_lossy(&encoded);
        f.write_str(line.trim_end_matches("\r\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_without_args() {
        assert_eq!(&Reply::ok_empty().serialize()[..], b"ok\r\n");
    }

    #[test]
    fn test_ok_with_arg() {
        assert_eq!(&Reply::ok(["a"]).serialize()[..], b"ok:a\r\n");
    }

    #[test]
    fn test_ok_empty_arg_becomes_null() {
        assert_eq!(&Reply::ok([""]).serialize()[..], b"ok:null\r\n");
        assert_eq!(&Reply::ok(["a", "", "b"]).serialize()[..], b"ok:a:null:b\r\n");
    }

    #[test]
    fn test_error_serialize() {
        let reply = Reply::error("cmd_error", "command failed");
        assert_eq!(&reply.serialize()[..], b"err:cmd_error:command failed\r\n");
    }

    #[test]
    fn test_error_keeps_empty_args() {
        let reply = Reply {
            kind: ReplyKind::Error,
            args: vec!["cmd_decode".to_string(), String::new()],
        };
        assert_eq!(&reply.serialize()[..], b"err:cmd_decode:\r\n");
    }

    #[test]
    fn test_command_failed_reply() {
        assert_eq!(
            &Reply::command_failed().serialize()[..],
            b"err:cmd_failed:command failed\r\n"
        );
    }

    #[test]
    fn test_operation_table() {
        assert_eq!(Operation::from_name("set"), Some(Operation::Set));
        assert_eq!(Operation::from_name("get"), Some(Operation::Get));
        assert_eq!(Operation::from_name("del"), Some(Operation::Delete));
        assert_eq!(Operation::from_name("SET"), None);
        assert_eq!(Operation::from_name("delete"), None);

        assert_eq!(Operation::Set.arity(), 2);
        assert_eq!(Operation::Get.arity(), 1);
        assert_eq!(Operation::Delete.arity(), 1);
        assert_eq!(Operation::Delete.to_string(), "del");
    }

    #[test]
    fn test_display_strips_terminator() {
        assert_eq!(Reply::ok(["v"]).to_string(), "ok:v");
    }
}
