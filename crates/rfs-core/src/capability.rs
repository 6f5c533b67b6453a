//! Names for the operations of the backend capability contract.
//!
//! Every operation a backend plugin may implement has a [`Capability`]
//! value. The generic client uses these for `supports()` queries and for
//! `NotImplemented` errors, so a caller can tell exactly which operation
//! a protocol declined.

use serde::{Deserialize, Serialize};

/// One operation of the backend capability contract.
///
/// A backend need not support every capability; unsupported operations
/// fail with [`ClientError::NotImplemented`](crate::ClientError) carrying
/// the capability that was requested.
///
/// # Examples
///
/// ```
/// use rfs_core::Capability;
///
/// assert_eq!(Capability::ReadStream.as_str(), "read_stream");
/// assert_eq!(Capability::Mkdir.to_string(), "mkdir");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Capability {
    /// Retrieve metadata for a single path.
    Stat,
    /// Read a whole file into memory.
    Read,
    /// Write a buffer to a file, creating or replacing it.
    Write,
    /// Copy between a live stream and a remote target.
    Copy,
    /// Create a directory (parents created by the client on demand).
    Mkdir,
    /// Rename/move a file or directory.
    Move,
    /// Remove a file.
    Remove,
    /// Create a hard link.
    Link,
    /// Create a symbolic link.
    Symlink,
    /// Open a streaming read of a file.
    ReadStream,
    /// List the immediate children of a directory.
    List,
}

impl Capability {
    /// Returns the snake_case name of this capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Copy => "copy",
            Self::Mkdir => "mkdir",
            Self::Move => "move",
            Self::Remove => "remove",
            Self::Link => "link",
            Self::Symlink => "symlink",
            Self::ReadStream => "read_stream",
            Self::List => "list",
        }
    }

    /// All capabilities, in contract order.
    ///
    /// Useful for schema/structure introspection and for building
    /// capability sets in backend implementations.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stat,
            Self::Read,
            Self::Write,
            Self::Copy,
            Self::Mkdir,
            Self::Move,
            Self::Remove,
            Self::Link,
            Self::Symlink,
            Self::ReadStream,
            Self::List,
        ]
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_as_str() {
        assert_eq!(Capability::Stat.as_str(), "stat");
        assert_eq!(Capability::ReadStream.as_str(), "read_stream");
        assert_eq!(Capability::List.as_str(), "list");
    }

    #[test]
    fn test_capability_display_matches_as_str() {
        for cap in Capability::all() {
            assert_eq!(cap.to_string(), cap.as_str());
        }
    }

    #[test]
    fn test_capability_serde_snake_case() {
        let json = serde_json::to_string(&Capability::ReadStream).unwrap();
        assert_eq!(json, r#""read_stream""#);
        let parsed: Capability = serde_json::from_str(r#""mkdir""#).unwrap();
        assert_eq!(parsed, Capability::Mkdir);
    }

    #[test]
    fn test_capability_all_is_exhaustive() {
        assert_eq!(Capability::all().len(), 11);
    }
}
