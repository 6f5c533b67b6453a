//! Watch lifecycle and change events.
//!
//! Consumers observe a watch through a stream of [`WatchEvent`]s on a
//! tokio mpsc channel rather than through mutable callback slots; the
//! sender side lives with the scanning task, the receiver with the
//! consumer.

use rfs_core::FileMeta;
use serde::{Deserialize, Serialize};

/// One event of a watch's event stream.
///
/// Paths in change events are relative to the watch root (a bare root
/// such as `/` or `.` leaves listing paths untouched).
///
/// # Examples
///
/// ```
/// use rfs_core::FileMeta;
/// use rfs_watcher::WatchEvent;
///
/// let event = WatchEvent::added("reports/july.csv", FileMeta::file(1024));
/// assert_eq!(event.path(), Some("reports/july.csv"));
/// assert!(event.is_change());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum WatchEvent {
    /// The watch became active.
    Started,

    /// A scan pass finished (and, without polling, the watch is idle).
    Completed,

    /// The watch was stopped and its records cleared.
    Stopped,

    /// A file was observed for the first time, or with a new size.
    Added {
        /// Path relative to the watch root.
        path: String,
        /// Metadata at observation time.
        meta: FileMeta,
    },

    /// A previously observed file was not seen by a full scan.
    Removed {
        /// Path relative to the watch root.
        path: String,
    },

    /// A scan-time failure, either per-entry or cycle-fatal.
    Error {
        /// The path involved, when one is known.
        path: Option<String>,
        /// Human-readable failure description.
        message: String,
    },
}

impl WatchEvent {
    /// Creates an [`WatchEvent::Added`] event.
    #[inline]
    #[must_use]
    pub fn added(path: impl Into<String>, meta: FileMeta) -> Self {
        Self::Added {
            path: path.into(),
            meta,
        }
    }

    /// Creates a [`WatchEvent::Removed`] event.
    #[inline]
    #[must_use]
    pub fn removed(path: impl Into<String>) -> Self {
        Self::Removed { path: path.into() }
    }

    /// Creates a [`WatchEvent::Error`] event for a specific path.
    #[inline]
    #[must_use]
    pub fn entry_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Creates a cycle-level [`WatchEvent::Error`] event.
    #[inline]
    #[must_use]
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::Error {
            path: None,
            message: message.into(),
        }
    }

    /// Returns the path carried by change/error events.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Added { path, .. } | Self::Removed { path } => Some(path.as_str()),
            Self::Error { path, .. } => path.as_deref(),
            Self::Started | Self::Completed | Self::Stopped => None,
        }
    }

    /// Returns `true` for `Added`/`Removed` events.
    #[inline]
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Removed { .. })
    }

    /// Returns `true` for `Error` events.
    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
