//! Request Line Decoder
//!
//! Turns one request line into a [`Command`]. The line has already had its
//! line terminator stripped by the connection handler.
//!
//! Decoding is deliberately literal: the line is split on `:`, no trimming,
//! quoting or escaping is applied, and the operation name must match exactly.

use crate::protocol::types::{Command, Operation, DELIMITER};
use thiserror::Error;

/// Errors that can occur while decoding a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The line carried no tokens at all
    #[error("empty request")]
    EmptyRequest,

    /// The line is not valid UTF-8
    #[error("request is not valid utf-8")]
    InvalidUtf8,

    /// The first token is not a known operation name
    #[error("unsupported command: {0}")]
    UnsupportedOperation(String),

    /// The number of arguments does not match the operation
    #[error("expected {expected} arguments for command '{operation}', but got {got}")]
    ArityMismatch {
        operation: Operation,
        expected: usize,
        got: usize,
    },
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decodes a request line into a command.
///
/// # Example
///
/// ```
/// use skv::protocol::{decode, Operation};
///
/// let cmd = decode("set:name:Ariz").unwrap();
/// assert_eq!(cmd.operation(), Operation::Set);
/// assert_eq!(cmd.args(), ["name", "Ariz"]);
/// ```
pub fn decode(line: &str) -> DecodeResult<Command> {
    if line.is_empty() {
        return Err(DecodeError::EmptyRequest);
    }

    let mut tokens = line.split(DELIMITER);

    // split always yields at least one token for a non-empty line
    let name = tokens.next().ok_or(DecodeError::EmptyRequest)?;
    let operation = Operation::from_name(name)
        .ok_or_else(|| DecodeError::UnsupportedOperation(name.to_string()))?;

    let args: Vec<String> = tokens.map(str::to_string).collect();
    if args.len() != operation.arity() {
        return Err(DecodeError::ArityMismatch {
            operation,
            expected: operation.arity(),
            got: args.len(),
        });
    }

    Ok(Command::new(operation, args))
}

/// Decodes a raw request line as read off the socket.
///
/// Bytes are never rewritten: a line that is not valid UTF-8 is rejected
/// with [`DecodeError::InvalidUtf8`] instead of being decoded lossily.
pub fn decode_bytes(line: &[u8]) -> DecodeResult<Command> {
    let line = std::str::from_utf8(line).map_err(|_| DecodeError::InvalidUtf8)?;
    decode(line)
}
