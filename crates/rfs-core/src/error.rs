//! Error types for the remotefs workspace.
//!
//! This module provides the [`ClientError`] type shared by the queue,
//! the connection pool, the watcher, and the generic client.

use crate::capability::Capability;

/// Errors that can occur while driving a remote storage backend.
///
/// # Error Recovery Strategy
///
/// - **Unknown protocol** ([`ClientError::UnknownProtocol`]): synchronous
///   registry failure; no connection is ever opened.
/// - **Not implemented** ([`ClientError::NotImplemented`]): the backend
///   declines the capability; callers should check `supports()` first.
/// - **Connect failure / transport closed**: the slot's connection state
///   is cleared and the in-flight call fails; the next call reconnects.
/// - **Missing parent** ([`ClientError::MissingParent`]): mkdir-specific
///   signal; the client retries parent-first. The only automatic retry
///   in the system.
/// - **Scan** ([`ClientError::Scan`]): a top-level listing failed; the
///   watch cycle is abandoned and no further cycles are scheduled.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The requested protocol has no registered backend.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    /// The backend does not implement the requested capability.
    #[error("{capability} not implemented for {protocol}")]
    NotImplemented {
        /// Protocol tag of the declining backend.
        protocol: String,
        /// The capability that was requested.
        capability: Capability,
    },

    /// Establishing a connection on a slot failed.
    ///
    /// The slot is left connection-less; the next call retries a fresh
    /// connect instead of reusing a dead handle.
    #[error("slot {slot} connect failed: {message}")]
    ConnectFailure {
        /// The slot whose connect failed.
        slot: usize,
        /// Backend-reported reason.
        message: String,
    },

    /// A live transport ended or closed underneath an operation.
    #[error("slot {slot} transport closed: {message}")]
    TransportClosed {
        /// The slot whose transport died.
        slot: usize,
        /// Backend-reported reason.
        message: String,
    },

    /// A directory could not be created because its parent is missing.
    ///
    /// Raised by backends from `mkdir`; the generic client reacts by
    /// creating the parent chain and retrying.
    #[error("missing parent directory for: {0}")]
    MissingParent(String),

    /// A path exists but is not a directory.
    #[error("{0} exists and is not a directory")]
    NotADirectory(String),

    /// A path does not exist on the remote.
    #[error("no such file or directory: {0}")]
    NotFound(String),

    /// A top-level directory listing failed during a watch scan.
    ///
    /// Aborts the current cycle; forwarded to the watch event stream.
    #[error("scan of {path} failed: {source}")]
    Scan {
        /// The directory whose listing failed.
        path: String,
        /// The underlying failure.
        #[source]
        source: Box<ClientError>,
    },

    /// A wire-level failure surfaced by a backend plugin.
    #[error("{protocol} backend error: {message}")]
    Backend {
        /// Protocol tag of the failing backend.
        protocol: String,
        /// Backend-reported reason.
        message: String,
    },

    /// File contents are not valid UTF-8.
    ///
    /// Returned by text-decoding helpers; raw byte reads never fail
    /// this way.
    #[error("contents of {0} are not valid UTF-8")]
    NonUtf8Contents(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Creates a new [`ClientError::NotImplemented`] error.
    #[inline]
    pub fn not_implemented(protocol: impl Into<String>, capability: Capability) -> Self {
        Self::NotImplemented {
            protocol: protocol.into(),
            capability,
        }
    }

    /// Creates a new [`ClientError::ConnectFailure`] error.
    #[inline]
    pub fn connect_failure(slot: usize, message: impl Into<String>) -> Self {
        Self::ConnectFailure {
            slot,
            message: message.into(),
        }
    }

    /// Creates a new [`ClientError::TransportClosed`] error.
    #[inline]
    pub fn transport_closed(slot: usize, message: impl Into<String>) -> Self {
        Self::TransportClosed {
            slot,
            message: message.into(),
        }
    }

    /// Creates a new [`ClientError::Backend`] error.
    #[inline]
    pub fn backend(protocol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            protocol: protocol.into(),
            message: message.into(),
        }
    }

    /// Wraps a listing failure as a [`ClientError::Scan`] error.
    #[inline]
    pub fn scan(path: impl Into<String>, source: ClientError) -> Self {
        Self::Scan {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if this is the mkdir missing-parent signal.
    #[inline]
    #[must_use]
    pub const fn is_missing_parent(&self) -> bool {
        matches!(self, Self::MissingParent(_))
    }

    /// Returns `true` if the backend declined the capability.
    #[inline]
    #[must_use]
    pub const fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// Returns `true` if the error invalidated the slot's connection.
    ///
    /// After such an error the slot holds no connection and the next
    /// dispatched call re-establishes one.
    #[inline]
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectFailure { .. } | Self::TransportClosed { .. })
    }

    /// Returns the remote path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingParent(path)
            | Self::NotADirectory(path)
            | Self::NotFound(path)
            | Self::NonUtf8Contents(path) => Some(path.as_str()),
            Self::Scan { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_display() {
        let err = ClientError::not_implemented("ftp", Capability::Symlink);
        assert_eq!(err.to_string(), "symlink not implemented for ftp");
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_connect_failure_display() {
        let err = ClientError::connect_failure(3, "connection refused");
        assert!(err.to_string().contains("slot 3"));
        assert!(err.to_string().contains("connection refused"));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_transport_closed_is_connection_error() {
        let err = ClientError::transport_closed(0, "peer reset");
        assert!(err.is_connection_error());
        assert!(!err.is_missing_parent());
    }

    #[test]
    fn test_missing_parent() {
        let err = ClientError::MissingParent("/a/b/c".to_owned());
        assert!(err.is_missing_parent());
        assert_eq!(err.path(), Some("/a/b/c"));
    }

    #[test]
    fn test_scan_wraps_source() {
        let inner = ClientError::backend("sftp", "permission denied");
        let err = ClientError::scan("/data", inner);
        assert_eq!(err.path(), Some("/data"));
        assert!(err.to_string().contains("/data"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_unknown_protocol_display() {
        let err = ClientError::UnknownProtocol("gopher".to_owned());
        assert_eq!(err.to_string(), "unknown protocol: gopher");
        assert!(err.path().is_none());
    }
}
