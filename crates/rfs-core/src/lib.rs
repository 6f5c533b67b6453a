//! Core types, errors, and utilities for the remotefs client toolkit.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`ClientError`] for consistent error handling
//! - [`ConnectionParams`], [`ParamSchema`] and [`ClientIdentity`] for
//!   describing and deduplicating backend targets
//! - [`Capability`] naming every operation of the backend contract
//! - [`FileMeta`] / [`DirEntry`] remote metadata types
//! - POSIX remote-path helpers in [`path`]
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod capability;
pub mod config;
pub mod error;
pub mod hash;
pub mod identity;
pub mod meta;
pub mod params;
pub mod path;

pub use capability::Capability;
pub use config::{PoolConfig, WatchConfig};
pub use error::ClientError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
pub use identity::ClientIdentity;
pub use meta::{DirEntry, EntryKind, FileMeta};
pub use params::{ConnectionParams, ParamKind, ParamSchema};
