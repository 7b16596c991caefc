//! Runtime tunables for the analysis CLI.
//!
//! Engine settings come from [`engine::SessionConfig::from_env`]; this module
//! adds the CLI's own knobs. Every value has a compile-time default and can be
//! overridden via an environment variable.

use std::path::PathBuf;

/// Default time to wait for the final position to reach full depth (in seconds).
const DEFAULT_SETTLE_SECS: u64 = 30;

/// Get the directory for log files.
///
/// Priority:
/// 1. `CHESS_ANALYZE_LOG_DIR` env variable if set
/// 2. `None`: logs go to stderr
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("CHESS_ANALYZE_LOG_DIR").ok().map(PathBuf::from)
}

/// Get the settle timeout in seconds.
///
/// Priority:
/// 1. `CHESS_ANALYZE_SETTLE_SECS` env variable if set (falls back to default
///    if the value cannot be parsed as a `u64`)
/// 2. `30` seconds as fallback
pub fn get_settle_secs() -> u64 {
    if let Ok(secs) = std::env::var("CHESS_ANALYZE_SETTLE_SECS") {
        return secs.parse().unwrap_or(DEFAULT_SETTLE_SECS);
    }

    DEFAULT_SETTLE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        let dir = get_log_dir();
        match std::env::var("CHESS_ANALYZE_LOG_DIR") {
            Ok(val) => assert_eq!(dir, Some(PathBuf::from(val))),
            Err(_) => assert_eq!(dir, None),
        }
    }

    #[test]
    fn test_get_settle_secs_default() {
        let secs = get_settle_secs();
        match std::env::var("CHESS_ANALYZE_SETTLE_SECS") {
            Ok(val) => assert_eq!(secs, val.parse().unwrap_or(DEFAULT_SETTLE_SECS)),
            Err(_) => assert_eq!(secs, DEFAULT_SETTLE_SECS),
        }
    }
}
