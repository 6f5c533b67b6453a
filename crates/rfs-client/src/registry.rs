//! Protocol factories and identity-deduplicated client instances.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rfs_core::{ClientError, ClientIdentity, ConnectionParams, FxHashMap, ParamSchema};
use tracing::{debug, info};

use crate::backend::BackendFactory;
use crate::client::RemoteClient;

/// Process-wide home of protocol plugins and the clients built from
/// them.
///
/// Resolving connection parameters first derives their canonical
/// identity through the protocol's factory; a client already serving
/// that identity is returned as-is instead of a second instance, so
/// all users of one endpoint share one connection pool and one watch.
/// A hit keeps the live client's tuning; callers that want different
/// tuning apply it through [`RemoteClient::update_settings`].
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use rfs_client::{BackendFactory, ClientRegistry};
/// # use rfs_core::ConnectionParams;
/// # fn demo(factory: Arc<dyn BackendFactory>) {
/// let registry = ClientRegistry::new();
/// registry.register(factory);
///
/// let params = ConnectionParams::new("sftp", "files.example.net");
/// let a = registry.resolve(&params).unwrap();
/// let b = registry.resolve(&params.clone().with_parallel(8)).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// # }
/// ```
#[derive(Default)]
pub struct ClientRegistry {
    factories: RwLock<FxHashMap<String, Arc<dyn BackendFactory>>>,
    clients: Mutex<FxHashMap<ClientIdentity, Arc<RemoteClient>>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a protocol plugin, replacing any factory already
    /// serving the same protocol name.
    pub fn register(&self, factory: Arc<dyn BackendFactory>) {
        let protocol = factory.protocol().to_owned();
        debug!(protocol = %protocol, "registering backend factory");
        self.factories.write().insert(protocol, factory);
    }

    /// Protocol names currently registered, sorted.
    #[must_use]
    pub fn protocols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// The parameter schema of `protocol`.
    pub fn parameter_schema(&self, protocol: &str) -> Result<ParamSchema, ClientError> {
        Ok(self.factory(protocol)?.schema())
    }

    /// The canonical identity `params` resolves to.
    pub fn identity(&self, params: &ConnectionParams) -> Result<ClientIdentity, ClientError> {
        Ok(self.factory(&params.protocol)?.identity(params))
    }

    /// Returns `true` when the two parameter sets name the same
    /// endpoint, however their tuning fields differ.
    pub fn identities_equal(
        &self,
        a: &ConnectionParams,
        b: &ConnectionParams,
    ) -> Result<bool, ClientError> {
        Ok(self.identity(a)? == self.identity(b)?)
    }

    /// Returns the client for `params`, creating it on first use.
    ///
    /// Parameter sets differing only in tuning fields map to the same
    /// client; a hit leaves the live client's tuning untouched.
    pub fn resolve(&self, params: &ConnectionParams) -> Result<Arc<RemoteClient>, ClientError> {
        let factory = self.factory(&params.protocol)?;
        let identity = factory.identity(params);

        if let Some(existing) = self.clients.lock().get(&identity) {
            return Ok(Arc::clone(existing));
        }

        // Built outside the lock; a racing resolve for the same
        // identity must still end with one shared instance.
        let backend = factory.create(params)?;
        let client = RemoteClient::new(backend, identity.clone(), params);
        let mut clients = self.clients.lock();
        if let Some(raced) = clients.get(&identity) {
            return Ok(Arc::clone(raced));
        }
        info!(identity = identity.as_str(), "caching new client");
        clients.insert(identity, Arc::clone(&client));
        Ok(client)
    }

    /// Drops the cached client for `identity`.
    ///
    /// Returns `true` when one was cached. Handles already resolved
    /// keep working; only future resolution builds afresh.
    pub fn evict(&self, identity: &ClientIdentity) -> bool {
        self.clients.lock().remove(identity).is_some()
    }

    /// Drops every cached client. Factories stay registered.
    pub fn clear(&self) {
        self.clients.lock().clear();
    }

    /// Number of distinct cached clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Returns `true` when no client is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    fn factory(&self, protocol: &str) -> Result<Arc<dyn BackendFactory>, ClientError> {
        self.factories
            .read()
            .get(protocol)
            .cloned()
            .ok_or_else(|| ClientError::UnknownProtocol(protocol.to_owned()))
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("protocols", &self.protocols())
            .field("clients", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_protocol() {
        let registry = ClientRegistry::new();
        let err = registry
            .resolve(&ConnectionParams::new("gopher", "example.net"))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownProtocol(name) if name == "gopher"));
    }

    #[test]
    fn test_empty_registry_lists_no_protocols() {
        let registry = ClientRegistry::new();
        assert!(registry.protocols().is_empty());
        assert!(registry.is_empty());
    }
}
