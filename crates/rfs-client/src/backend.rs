//! The capability contract a protocol plugin satisfies.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use rfs_core::{
    Capability, ClientError, ClientIdentity, ConnectionParams, DirEntry, FileMeta, ParamSchema,
};

/// Chunked file contents, as a backend produces them.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ClientError>>;

/// Per-slot protocol operations.
///
/// A backend owns one independent connection per slot index and is
/// only ever asked to use a slot it was connected on. `connect` is
/// idempotent: calling it on an already connected slot is a no-op, so
/// the client can call it unconditionally before every operation.
///
/// Every file operation has a default body failing with
/// [`ClientError::NotImplemented`]; a plugin overrides the subset its
/// protocol supports and reports that subset from [`capabilities`].
/// Only `connect`, `disconnect` and `list_dir` are required — listing
/// is what the watch loop is built on.
///
/// [`capabilities`]: Backend::capabilities
#[async_trait]
pub trait Backend: Send + Sync {
    /// Protocol name, e.g. `"sftp"`. Used in errors and identities.
    fn protocol(&self) -> &str;

    /// The operations this plugin overrides.
    fn capabilities(&self) -> &[Capability];

    /// Returns `true` when `capability` is listed by [`Backend::capabilities`].
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// The error an unimplemented capability fails with.
    fn unsupported(&self, capability: Capability) -> ClientError {
        ClientError::not_implemented(self.protocol(), capability)
    }

    /// Establishes the connection for `slot` if it is not already up.
    async fn connect(&self, slot: usize) -> Result<(), ClientError>;

    /// Tears down the connection for `slot`. No-op when not connected.
    async fn disconnect(&self, slot: usize) -> Result<(), ClientError>;

    /// Lists the immediate entries of `dir`.
    async fn list_dir(&self, slot: usize, dir: &str) -> Result<Vec<DirEntry>, ClientError>;

    /// Returns metadata for `path`.
    async fn stat(&self, _slot: usize, _path: &str) -> Result<FileMeta, ClientError> {
        Err(self.unsupported(Capability::Stat))
    }

    /// Reads the full contents of `path`.
    async fn read(&self, _slot: usize, _path: &str) -> Result<Vec<u8>, ClientError> {
        Err(self.unsupported(Capability::Read))
    }

    /// Writes `contents` to `path`, replacing any existing file.
    async fn write(&self, _slot: usize, _path: &str, _contents: &[u8]) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Write))
    }

    /// Writes the chunks of `source` to `dest`, returning bytes written.
    async fn copy(
        &self,
        _slot: usize,
        _source: ByteStream,
        _dest: &str,
    ) -> Result<u64, ClientError> {
        Err(self.unsupported(Capability::Copy))
    }

    /// Creates the single directory `path`.
    ///
    /// Must fail with [`ClientError::MissingParent`] when the parent
    /// does not exist; the client reacts by creating ancestors and
    /// retrying, so a plugin never implements recursion itself.
    async fn mkdir(&self, _slot: usize, _path: &str) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Mkdir))
    }

    /// Moves `from` to `to`.
    async fn rename(&self, _slot: usize, _from: &str, _to: &str) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Move))
    }

    /// Removes the file or empty directory at `path`.
    async fn remove(&self, _slot: usize, _path: &str) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Remove))
    }

    /// Creates a hard link at `link` pointing to `target`.
    async fn hard_link(&self, _slot: usize, _target: &str, _link: &str) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Link))
    }

    /// Creates a symbolic link at `link` pointing to `target`.
    async fn symlink(&self, _slot: usize, _target: &str, _link: &str) -> Result<(), ClientError> {
        Err(self.unsupported(Capability::Symlink))
    }

    /// Opens `path` for chunked reading.
    async fn read_stream(&self, _slot: usize, _path: &str) -> Result<ByteStream, ClientError> {
        Err(self.unsupported(Capability::ReadStream))
    }
}

/// Constructs [`Backend`] instances for one protocol.
///
/// Registered with a [`ClientRegistry`](crate::ClientRegistry), which
/// consults `identity` to decide whether two parameter sets name the
/// same endpoint before calling `create`.
pub trait BackendFactory: Send + Sync {
    /// Protocol name this factory serves.
    fn protocol(&self) -> &str;

    /// Declares the connection parameters the protocol understands.
    fn schema(&self) -> ParamSchema;

    /// Canonical identity of the endpoint `params` names.
    ///
    /// Pure and deterministic. The default covers protocols whose
    /// identity is the standard endpoint fields; a factory overrides
    /// it when extra parameters distinguish endpoints.
    fn identity(&self, params: &ConnectionParams) -> ClientIdentity {
        ClientIdentity::from_params(params)
    }

    /// Builds a backend for the endpoint `params` names.
    fn create(&self, params: &ConnectionParams) -> Result<Arc<dyn Backend>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ListOnly;

    #[async_trait]
    impl Backend for ListOnly {
        fn protocol(&self) -> &str {
            "listonly"
        }

        fn capabilities(&self) -> &[Capability] {
            &[Capability::List]
        }

        async fn connect(&self, _slot: usize) -> Result<(), ClientError> {
            Ok(())
        }

        async fn disconnect(&self, _slot: usize) -> Result<(), ClientError> {
            Ok(())
        }

        async fn list_dir(&self, _slot: usize, _dir: &str) -> Result<Vec<DirEntry>, ClientError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_defaults_fail_with_not_implemented() {
        let backend: Arc<dyn Backend> = Arc::new(ListOnly);
        let err = backend.stat(0, "/x").await.unwrap_err();
        assert!(err.is_not_implemented());
        assert!(err.to_string().contains("listonly"));

        let err = backend.symlink(0, "/a", "/b").await.unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_supports_follows_capabilities() {
        let backend = ListOnly;
        assert!(backend.supports(Capability::List));
        assert!(!backend.supports(Capability::Read));
    }
}
