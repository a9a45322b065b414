//! Configuration for the chessweb server.
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable. Command-line flags, applied in
//! `main`, take precedence over both.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default listen port.
const DEFAULT_PORT: u16 = 5000;

/// Default engine command, looked up on `PATH`.
const DEFAULT_ENGINE: &str = "stockfish";

/// Default time limit for a single oracle query (in milliseconds).
const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 10_000;

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub engine: String,
    pub oracle_timeout: Duration,
    pub engine_threads: Option<u32>,
    pub engine_hash_mb: Option<u32>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            addr: get_addr(),
            engine: get_engine(),
            oracle_timeout: Duration::from_millis(get_oracle_timeout_ms()),
            engine_threads: parse_var("CHESSWEB_ENGINE_THREADS"),
            engine_hash_mb: parse_var("CHESSWEB_ENGINE_HASH_MB"),
            log_dir: std::env::var_os("CHESSWEB_LOG_DIR").map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            engine: DEFAULT_ENGINE.to_string(),
            oracle_timeout: Duration::from_millis(DEFAULT_ORACLE_TIMEOUT_MS),
            engine_threads: None,
            engine_hash_mb: None,
            log_dir: None,
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

/// Get the listen address.
///
/// Priority:
/// 1. `CHESSWEB_ADDR` env variable if set and parseable
/// 2. `127.0.0.1:5000` as fallback
pub fn get_addr() -> SocketAddr {
    parse_var("CHESSWEB_ADDR").unwrap_or_else(default_addr)
}

/// Get the engine command or path.
///
/// Priority:
/// 1. `CHESSWEB_ENGINE` env variable if set
/// 2. `stockfish` as fallback
pub fn get_engine() -> String {
    std::env::var("CHESSWEB_ENGINE").unwrap_or_else(|_| DEFAULT_ENGINE.to_string())
}

/// Get the per-query oracle timeout in milliseconds.
pub fn get_oracle_timeout_ms() -> u64 {
    parse_var("CHESSWEB_ORACLE_TIMEOUT_MS").unwrap_or(DEFAULT_ORACLE_TIMEOUT_MS)
}

/// Read and parse an environment variable. Unset or unparseable values are `None`.
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", name, value);
            None
        }
    }
}
