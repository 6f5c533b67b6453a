//! Protocol-agnostic remote storage client.
//!
//! A [`RemoteClient`] wraps one backend plugin behind a bounded slot
//! queue: every operation is dispatched onto one of `parallel`
//! connection slots, connecting lazily on first use and disconnecting
//! after an idle window. The client also hosts the polling watch loop
//! and implements the one-level listing the scanner consumes.
//!
//! Backends plug in through two traits:
//!
//! - [`Backend`] — the per-slot capability contract. Every operation
//!   defaults to [`ClientError::NotImplemented`]; a concrete plugin
//!   overrides what its protocol can do and lists it in
//!   [`Backend::capabilities`].
//! - [`BackendFactory`] — registered with a [`ClientRegistry`], which
//!   deduplicates clients by canonical connection identity so two
//!   resolutions of the same endpoint share one pool.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rfs_client::{BackendFactory, ClientRegistry};
//! # use rfs_core::{ClientError, ConnectionParams};
//! # async fn demo(factory: Arc<dyn BackendFactory>) -> Result<(), ClientError> {
//! let registry = ClientRegistry::new();
//! registry.register(factory);
//!
//! let params = ConnectionParams::new("sftp", "files.example.net")
//!     .with_credentials("deploy", "hunter2");
//! let client = registry.resolve(&params)?;
//! let listing = client.list_dir("/srv/incoming").await?;
//! # let _ = listing;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod backend;
pub mod client;
pub mod registry;
pub mod stream;

pub use backend::{Backend, BackendFactory, ByteStream};
pub use client::RemoteClient;
pub use registry::ClientRegistry;
pub use stream::ReadStream;
