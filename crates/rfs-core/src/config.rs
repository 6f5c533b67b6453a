//! Configuration structures for the remotefs client toolkit.
//!
//! This module provides the tuning types attached to a connection:
//!
//! - [`PoolConfig`] - Connection pool settings (parallelism, idle timeout)
//! - [`WatchConfig`] - Polling watcher settings (enabled, interval)
//!
//! Tuning never participates in client identity: two parameter sets that
//! differ only in these values resolve to the same client.

use serde::{Deserialize, Serialize};

/// Default idle window before an unused slot connection is closed.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;

/// Default polling interval when watching is enabled.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 10_000;

/// Configuration for the per-client connection pool.
///
/// Controls how many backend connections a client multiplexes over and
/// how long an idle connection is kept alive.
///
/// # Examples
///
/// ```
/// use rfs_core::PoolConfig;
///
/// let config = PoolConfig::default();
/// assert_eq!(config.parallel, 2);
/// assert_eq!(config.idle_timeout_ms, 300_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of concurrently executing operations (= slots).
    pub parallel: usize,

    /// Idle window in milliseconds before a slot's connection is
    /// disconnected. The timer re-arms after every operation and is
    /// cancelled when the slot is reused.
    pub idle_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            parallel: 2,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

/// Configuration for the polling watcher.
///
/// Controls whether full-tree scans repeat, and how far apart.
///
/// # Examples
///
/// ```
/// use rfs_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert!(!config.polling);
/// assert_eq!(config.polling_interval_ms, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether a new scan is scheduled after each one completes.
    ///
    /// When `false` the watcher performs a single scan and returns to
    /// idle.
    pub polling: bool,

    /// Delay in milliseconds between the end of one scan and the start
    /// of the next. Ignored when `polling` is `false`.
    pub polling_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            polling: false,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
        }
    }
}

impl WatchConfig {
    /// Returns the effective polling interval, or `None` when polling
    /// is disabled or the interval is zero.
    #[must_use]
    pub const fn interval(&self) -> Option<std::time::Duration> {
        if self.polling && self.polling_interval_ms > 0 {
            Some(std::time::Duration::from_millis(self.polling_interval_ms))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.parallel, 2);
        assert_eq!(config.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    }

    #[test]
    fn test_watch_config_defaults() {
        let config = WatchConfig::default();
        assert!(!config.polling);
        assert_eq!(config.polling_interval_ms, DEFAULT_POLLING_INTERVAL_MS);
    }

    #[test]
    fn test_watch_interval_disabled() {
        let config = WatchConfig::default();
        assert_eq!(config.interval(), None);

        let zero = WatchConfig {
            polling: true,
            polling_interval_ms: 0,
        };
        assert_eq!(zero.interval(), None);
    }

    #[test]
    fn test_watch_interval_enabled() {
        let config = WatchConfig {
            polling: true,
            polling_interval_ms: 500,
        };
        assert_eq!(
            config.interval(),
            Some(std::time::Duration::from_millis(500))
        );
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"parallel": 8}"#;
        let config: PoolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.parallel, 8);
        assert_eq!(config.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    }
}
