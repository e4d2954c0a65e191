//! Process configuration.
//!
//! Every option can be given as a flag or through the environment; flags win.

use crate::server::{ServerConfig, DEFAULT_ADDR};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// skv - an in-memory key-value server
#[derive(Debug, Clone, Parser)]
#[command(name = "skv", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "SERVER_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Log filter, e.g. `info` or `skv=debug`; RUST_LOG takes precedence
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Seconds a connection may stay idle before it is closed
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Bytes a single connection may send before it is closed
    #[arg(long, env = "MAX_READ_BYTES", default_value_t = 1000)]
    pub max_read_bytes: u64,
}

/// How log events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable lines
    Text,
}

impl Config {
    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            addr: self.addr.clone(),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            max_read_bytes: self.max_read_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_server_defaults() {
        let config = Config::try_parse_from(["skv"]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.server(), ServerConfig::default());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "skv",
            "--addr",
            "127.0.0.1:7000",
            "--idle-timeout-secs",
            "5",
            "--max-read-bytes",
            "4096",
        ])
        .unwrap();

        let server = config.server();
        assert_eq!(server.addr, "127.0.0.1:7000");
        assert_eq!(server.idle_timeout, Duration::from_secs(5));
        assert_eq!(server.max_read_bytes, 4096);
    }

    #[test]
    fn test_rejects_bad_number() {
        assert!(Config::try_parse_from(["skv", "--max-read-bytes", "lots"]).is_err());
    }

    #[test]
    fn test_log_format() {
        let config = Config::try_parse_from(["skv", "--log-format", "text"]).unwrap();
        assert_eq!(config.log_format, LogFormat::Text);

        assert!(Config::try_parse_from(["skv", "--log-format", "xml"]).is_err());
    }
}
