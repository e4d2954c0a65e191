//! Wire Protocol Implementation
//!
//! This module implements the line-oriented text protocol spoken by skv.
//!
//! ## Overview
//!
//! Every request is one line of `:`-separated tokens, `<op>:<arg>...`,
//! terminated by `\n` or `\r\n`. Every reply is one line,
//! `ok[:<arg>...]\r\n` or `err:<token>:<message>\r\n`.
//!
//! Both directions are pure functions with no shared state, so any number of
//! connection handlers may use them concurrently.
//!
//! ## Modules
//!
//! - `types`: `Command`, `Reply` and reply encoding
//! - `parser`: request line decoding (`decode`, or `decode_bytes` for raw socket input)
//!
//! ## Example
//!
//! ```
//! use skv::protocol::{decode, Reply};
//!
//! let cmd = decode("get:name").unwrap();
//! assert_eq!(cmd.args(), ["name"]);
//!
//! let bytes = Reply::ok([""]).serialize();
//! assert_eq!(&bytes[..], b"ok:null\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{decode, decode_bytes, DecodeError, DecodeResult};
pub use types::{error_token, Command, Operation, Reply, ReplyKind};
