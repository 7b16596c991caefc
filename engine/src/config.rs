//! Configuration for engine sessions
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable.

use std::path::PathBuf;
use std::time::Duration;

/// Fixed search depth for every analysis request, in plies.
pub const SEARCH_DEPTH: u32 = 15;

/// Default time allowed for `uci` → `readyok` (in seconds).
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

const MAX_THREADS: u32 = 16;
const MAX_HASH_MB: u32 = 2048;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Engine binary; discovered in common install locations when unset
    pub engine_path: Option<PathBuf>,
    pub handshake_timeout: Duration,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            threads: None,
            hash_mb: None,
        }
    }
}

impl SessionConfig {
    /// Build a config from `CHESS_ENGINE_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            engine_path: get_engine_path(),
            handshake_timeout: Duration::from_secs(get_handshake_timeout_secs()),
            threads: parse_env("CHESS_ENGINE_THREADS"),
            hash_mb: parse_env("CHESS_ENGINE_HASH_MB"),
        }
    }

    /// Threads option value, clamped to what the engine accepts
    pub fn threads_option(&self) -> Option<u32> {
        self.threads.map(|t| t.clamp(1, MAX_THREADS))
    }

    /// Hash option value in MB, clamped
    pub fn hash_option(&self) -> Option<u32> {
        self.hash_mb.map(|h| h.clamp(1, MAX_HASH_MB))
    }
}

/// Get the engine binary path.
///
/// Priority:
/// 1. `CHESS_ENGINE_PATH` env variable if set
/// 2. `None`, leaving discovery to the process worker
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var("CHESS_ENGINE_PATH").ok().map(PathBuf::from)
}

/// Get the handshake timeout in seconds.
///
/// Priority:
/// 1. `CHESS_ENGINE_HANDSHAKE_TIMEOUT_SECS` env variable if set (falls back to
///    the default if the value cannot be parsed as a `u64`)
/// 2. `10` seconds as fallback
pub fn get_handshake_timeout_secs() -> u64 {
    parse_env("CHESS_ENGINE_HANDSHAKE_TIMEOUT_SECS").unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_handshake_timeout_secs_default() {
        let timeout = get_handshake_timeout_secs();
        match std::env::var("CHESS_ENGINE_HANDSHAKE_TIMEOUT_SECS") {
            Ok(val) => assert_eq!(
                timeout,
                val.trim().parse().unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS)
            ),
            Err(_) => assert_eq!(timeout, DEFAULT_HANDSHAKE_TIMEOUT_SECS),
        }
    }

    #[test]
    fn test_get_engine_path() {
        let path = get_engine_path();
        match std::env::var("CHESS_ENGINE_PATH") {
            Ok(val) => assert_eq!(path, Some(PathBuf::from(val))),
            Err(_) => assert_eq!(path, None),
        }
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.threads_option(), None);
        assert_eq!(config.hash_option(), None);
    }

    #[test]
    fn test_option_clamping() {
        let config = SessionConfig {
            threads: Some(64),
            hash_mb: Some(0),
            ..Default::default()
        };
        assert_eq!(config.threads_option(), Some(16));
        assert_eq!(config.hash_option(), Some(1));
    }
}
