//! Breadth-first tree traversal and per-cycle diffing.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use rfs_core::path;
use rfs_core::{ClientError, DirEntry, EntryKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::WatchEvent;
use crate::records::{CycleCounter, CycleId, FileRecord, RecordMap};

/// Pattern matching dotfiles and dot-directories anywhere in a path.
pub const DEFAULT_IGNORE_PATTERN: &str = r"(^|[/\\])\.";

/// Returns the shared compiled form of [`DEFAULT_IGNORE_PATTERN`].
#[must_use]
pub fn default_ignore() -> &'static Regex {
    static IGNORE: LazyLock<Regex> = LazyLock::new(|| {
        #[allow(clippy::expect_used)]
        Regex::new(DEFAULT_IGNORE_PATTERN).expect("default ignore pattern is valid")
    });
    &IGNORE
}

/// One-level directory listing, the only capability a scan consumes.
///
/// The generic client implements this over whatever backend it wraps,
/// which keeps the scanner free of any transport concern.
#[async_trait]
pub trait DirLister: Send + Sync {
    /// Lists the immediate entries of `dir` with their metadata.
    async fn list_dir(&self, dir: &str) -> Result<Vec<DirEntry>, ClientError>;
}

/// Counts of what one scan pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// The cycle this summary describes.
    pub cycle: CycleId,
    /// Files newly observed or observed with a changed size.
    pub added: usize,
    /// Previously observed files no longer present.
    pub removed: usize,
}

impl ScanSummary {
    /// Returns `true` when the pass observed no change at all.
    #[inline]
    #[must_use]
    pub const fn is_quiescent(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Diff engine for one watched tree.
///
/// Holds the record of every file observed so far; each [`scan`] pass
/// walks the tree breadth-first, emits [`WatchEvent::Added`] for
/// unseen or resized files, and after the full traversal emits
/// [`WatchEvent::Removed`] for records the pass did not refresh.
///
/// The record map is behind a mutex that is never held across an
/// await, so [`clear`] can interleave with an in-flight scan.
///
/// [`scan`]: DiffScanner::scan
/// [`clear`]: DiffScanner::clear
#[derive(Debug, Default)]
pub struct DiffScanner {
    records: Arc<Mutex<RecordMap>>,
    cycles: CycleCounter,
}

impl DiffScanner {
    /// Creates an empty scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently on record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` when no file is on record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forgets every record, so the next scan re-reports the full tree.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Runs one scan pass over `root`, streaming events to `events`.
    ///
    /// A failure listing `root` itself aborts the pass with
    /// [`ClientError::Scan`]. A failure listing a subdirectory is
    /// reported as a [`WatchEvent::Error`] and skips that subtree;
    /// records below it are refreshed rather than falsely removed.
    pub async fn scan(
        &self,
        lister: &dyn DirLister,
        root: &str,
        ignored: &Regex,
        events: &mpsc::Sender<WatchEvent>,
    ) -> Result<ScanSummary, ClientError> {
        let cycle = self.cycles.mint();
        let root = path::normalize(root);
        let mut added = 0usize;

        let mut pending: VecDeque<String> = VecDeque::new();
        pending.push_back(root.clone());
        let mut first = true;

        while let Some(dir) = pending.pop_front() {
            let entries = match lister.list_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if first => {
                    return Err(ClientError::scan(&dir, err));
                }
                Err(err) => {
                    warn!(dir = %dir, error = %err, "directory listing failed, skipping subtree");
                    self.refresh_subtree(&dir, cycle);
                    let _ = events
                        .send(WatchEvent::entry_error(
                            path::relative_filename(&root, &dir),
                            err.to_string(),
                        ))
                        .await;
                    continue;
                }
            };
            first = false;

            for entry in entries {
                let full = entry.path_under(&dir);
                if ignored.is_match(&full) {
                    continue;
                }
                match entry.meta.kind {
                    EntryKind::Directory => pending.push_back(full),
                    EntryKind::File | EntryKind::Symlink => {
                        if self.observe(&full, entry.meta.size, cycle) {
                            added += 1;
                            let _ = events
                                .send(WatchEvent::added(
                                    path::relative_filename(&root, &full),
                                    entry.meta,
                                ))
                                .await;
                        }
                    }
                }
            }
        }

        let stale = self.take_stale(cycle);
        let removed = stale.len();
        for full in stale {
            let _ = events
                .send(WatchEvent::removed(path::relative_filename(&root, &full)))
                .await;
        }

        let summary = ScanSummary {
            cycle,
            added,
            removed,
        };
        debug!(%cycle, added, removed, root = %root, "scan pass complete");
        Ok(summary)
    }

    /// Records one observed file; returns `true` when it is new or its
    /// size changed since the last observation.
    fn observe(&self, full: &str, size: u64, cycle: CycleId) -> bool {
        let mut records = self.records.lock();
        let changed = match records.get(full) {
            Some(record) => record.size != size,
            None => true,
        };
        records.insert(full.to_owned(), FileRecord::observed(size, cycle));
        changed
    }

    /// Marks every record at or below `dir` as observed this cycle.
    fn refresh_subtree(&self, dir: &str, cycle: CycleId) {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut records = self.records.lock();
        for (full, record) in records.iter_mut() {
            if full.starts_with(&prefix) {
                record.last_seen = cycle;
            }
        }
    }

    /// Removes and returns every record this cycle did not refresh.
    fn take_stale(&self, cycle: CycleId) -> Vec<String> {
        let mut records = self.records.lock();
        let stale: Vec<String> = records
            .iter()
            .filter(|(_, record)| record.is_stale(cycle))
            .map(|(full, _)| full.clone())
            .collect();
        for full in &stale {
            records.remove(full);
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfs_core::{FileMeta, FxHashMap};

    /// In-memory tree: directory path to its entries.
    struct MemLister {
        tree: Mutex<FxHashMap<String, Vec<DirEntry>>>,
        fail: Mutex<Option<String>>,
    }

    impl MemLister {
        fn new() -> Self {
            Self {
                tree: Mutex::new(FxHashMap::default()),
                fail: Mutex::new(None),
            }
        }

        fn dir(&self, path: &str, entries: Vec<DirEntry>) {
            self.tree.lock().insert(path.to_owned(), entries);
        }

        fn fail_on(&self, path: &str) {
            *self.fail.lock() = Some(path.to_owned());
        }

        fn remove_entry(&self, dir: &str, name: &str) {
            if let Some(entries) = self.tree.lock().get_mut(dir) {
                entries.retain(|entry| entry.name != name);
            }
        }
    }

    #[async_trait]
    impl DirLister for MemLister {
        async fn list_dir(&self, dir: &str) -> Result<Vec<DirEntry>, ClientError> {
            if self.fail.lock().as_deref() == Some(dir) {
                return Err(ClientError::transport_closed(0, "listing refused"));
            }
            self.tree
                .lock()
                .get(dir)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(dir.to_owned()))
        }
    }

    fn file(name: &str, size: u64) -> DirEntry {
        DirEntry {
            name: name.to_owned(),
            meta: FileMeta::file(size),
        }
    }

    fn directory(name: &str) -> DirEntry {
        DirEntry {
            name: name.to_owned(),
            meta: FileMeta::directory(),
        }
    }

    fn symlink(name: &str) -> DirEntry {
        DirEntry {
            name: name.to_owned(),
            meta: FileMeta::symlink(),
        }
    }

    fn sample_tree() -> MemLister {
        let lister = MemLister::new();
        lister.dir(
            "/data",
            vec![file("a.txt", 3), directory("sub"), file(".hidden", 9)],
        );
        lister.dir("/data/sub", vec![file("b.txt", 5)]);
        lister
    }

    async fn drain(rx: &mut mpsc::Receiver<WatchEvent>) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_first_scan_reports_every_visible_file() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 0);

        let mut paths: Vec<String> = drain(&mut rx)
            .await
            .into_iter()
            .filter_map(|event| event.path().map(str::to_owned))
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_symlinks_are_tracked_like_files() {
        let lister = MemLister::new();
        lister.dir("/data", vec![file("a.txt", 3), symlink("latest")]);
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.added, 2);

        let mut paths: Vec<String> = drain(&mut rx)
            .await
            .into_iter()
            .filter_map(|event| event.path().map(str::to_owned))
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "latest"]);
    }

    #[tokio::test]
    async fn test_quiescent_scan_is_silent() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        drain(&mut rx).await;

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert!(summary.is_quiescent());
        assert!(drain(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_removal_reported_exactly_once() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        drain(&mut rx).await;

        lister.remove_entry("/data/sub", "b.txt");
        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.removed, 1);
        let events = drain(&mut rx).await;
        assert_eq!(events, vec![WatchEvent::removed("sub/b.txt")]);

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert!(summary.is_quiescent());
    }

    #[tokio::test]
    async fn test_size_change_reports_added_again() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        drain(&mut rx).await;

        lister.remove_entry("/data", "a.txt");
        lister
            .tree
            .lock()
            .get_mut("/data")
            .unwrap()
            .push(file("a.txt", 40));

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 0);
        let events = drain(&mut rx).await;
        assert_eq!(events[0].path(), Some("a.txt"));
    }

    #[tokio::test]
    async fn test_failed_subtree_keeps_its_records() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        drain(&mut rx).await;

        lister.fail_on("/data/sub");
        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.removed, 0, "unreachable subtree must not read as removals");
        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
        assert_eq!(events[0].path(), Some("sub"));
        assert_eq!(scanner.len(), 2);
    }

    #[tokio::test]
    async fn test_root_listing_failure_is_fatal() {
        let lister = sample_tree();
        lister.fail_on("/data");
        let scanner = DiffScanner::new();
        let (tx, _rx) = mpsc::channel(16);

        let err = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Scan { .. }));
    }

    #[tokio::test]
    async fn test_clear_forces_full_rereport() {
        let lister = sample_tree();
        let scanner = DiffScanner::new();
        let (tx, mut rx) = mpsc::channel(16);

        scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        drain(&mut rx).await;
        scanner.clear();
        assert!(scanner.is_empty());

        let summary = scanner
            .scan(&lister, "/data", default_ignore(), &tx)
            .await
            .unwrap();
        assert_eq!(summary.added, 2);
    }

    #[test]
    fn test_default_ignore_matches_dot_entries() {
        let ignore = default_ignore();
        assert!(ignore.is_match("/data/.git"));
        assert!(ignore.is_match(".env"));
        assert!(ignore.is_match(r"data\.hidden"));
        assert!(!ignore.is_match("/data/file.txt"));
    }
}
