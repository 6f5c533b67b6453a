//! Polling tree scanner and add/remove diff engine.
//!
//! Remote backends have no change notification, so watching a tree
//! means scanning it repeatedly and diffing successive scans. This
//! crate provides the pieces the generic client composes into a watch:
//!
//! - [`DirLister`] — the one-level listing capability a scan consumes
//! - [`DiffScanner`] — breadth-first traversal + per-cycle diff over a
//!   [`FileRecord`] map
//! - [`WatchEvent`] — structured lifecycle/change events streamed over
//!   a tokio mpsc channel
//!
//! # How a cycle works
//!
//! ```text
//! mint CycleId ──► list root ──► queue subdirectories ──► list them …
//!                     │
//!                     ├─ unseen file / size change ──► Added event,
//!                     │                                record updated
//!                     └─ record not re-observed this cycle
//!                                 ──► Removed event, record pruned
//! ```
//!
//! A file's record carries the cycle id it was last observed in; after
//! a full traversal, any record still carrying an older id names a file
//! that vanished. Per-entry failures are logged and forwarded as
//! [`WatchEvent::Error`] without aborting the scan; a failed directory
//! listing aborts the whole cycle.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod events;
pub mod records;
pub mod scanner;

pub use events::WatchEvent;
pub use records::{CycleCounter, CycleId, FileRecord};
pub use scanner::{DEFAULT_IGNORE_PATTERN, DiffScanner, DirLister, ScanSummary, default_ignore};
