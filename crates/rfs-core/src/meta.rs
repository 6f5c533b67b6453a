//! Remote file metadata types.
//!
//! These are the protocol-neutral shapes backends return from `stat`
//! and one-level directory listings. A backend maps its wire attributes
//! into [`FileMeta`]; the watcher and client never see protocol detail.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// The kind of a remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
}

/// Metadata for one remote entry.
///
/// # Examples
///
/// ```
/// use rfs_core::{EntryKind, FileMeta};
///
/// let meta = FileMeta::file(1024);
/// assert!(meta.is_file());
/// assert_eq!(meta.size, 1024);
///
/// let dir = FileMeta::directory();
/// assert!(dir.is_dir());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Entry kind.
    pub kind: EntryKind,

    /// Size in bytes; `0` for directories on backends that report none.
    pub size: u64,

    /// Last modification time, when the backend reports one.
    pub modified: Option<SystemTime>,
}

impl FileMeta {
    /// Creates metadata for a regular file of the given size.
    #[inline]
    #[must_use]
    pub const fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified: None,
        }
    }

    /// Creates metadata for a directory.
    #[inline]
    #[must_use]
    pub const fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            modified: None,
        }
    }

    /// Creates metadata for a symbolic link.
    #[inline]
    #[must_use]
    pub const fn symlink() -> Self {
        Self {
            kind: EntryKind::Symlink,
            size: 0,
            modified: None,
        }
    }

    /// Attaches a modification time.
    #[inline]
    #[must_use]
    pub const fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Returns `true` for directories.
    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Returns `true` for regular files.
    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }
}

/// One entry of a one-level directory listing.
///
/// `name` is the bare child name; callers join it onto the listed
/// directory with [`path::join`](crate::path::join).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Child name within the listed directory (no separators).
    pub name: String,

    /// Metadata for the child.
    pub meta: FileMeta,
}

impl DirEntry {
    /// Creates a listing entry.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, meta: FileMeta) -> Self {
        Self {
            name: name.into(),
            meta,
        }
    }

    /// Returns the full path of this entry under `dir`.
    #[must_use]
    pub fn path_under(&self, dir: &str) -> String {
        crate::path::join(dir, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_meta_constructors() {
        assert!(FileMeta::file(10).is_file());
        assert!(FileMeta::directory().is_dir());
        assert!(!FileMeta::symlink().is_dir());
        assert_eq!(FileMeta::file(10).size, 10);
    }

    #[test]
    fn test_file_meta_with_modified() {
        let now = SystemTime::now();
        let meta = FileMeta::file(1).with_modified(now);
        assert_eq!(meta.modified, Some(now));
    }

    #[test]
    fn test_dir_entry_path_under() {
        let entry = DirEntry::new("report.csv", FileMeta::file(42));
        assert_eq!(entry.path_under("/data"), "/data/report.csv");
        assert_eq!(entry.path_under("."), "report.csv");
    }

    #[test]
    fn test_entry_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&EntryKind::Directory).unwrap(),
            r#""directory""#
        );
    }
}
