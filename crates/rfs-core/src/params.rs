//! Connection parameters and the per-protocol parameter schema.
//!
//! [`ConnectionParams`] carries everything needed to reach a backend:
//! the protocol tag, the backend-specific fields that define the
//! target's identity (host, port, credentials), and the tuning fields
//! (parallelism, polling) which deliberately do not.
//!
//! [`ParamSchema`] is the declared option surface of a protocol,
//! consumed by configuration UIs and validators; the core never
//! enforces it at runtime.

use serde::{Deserialize, Serialize};

use crate::config::{PoolConfig, WatchConfig};

/// The kind tag of a declared connection option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ParamKind {
    /// A numeric option (port, parallelism, intervals).
    Numeric,
    /// A true/false option.
    Boolean,
    /// A free-text option.
    Text,
    /// A sensitive text option that UIs should mask.
    Secret,
}

/// Declared option names and kinds for a protocol.
///
/// Built by backend factories; order of declaration is preserved so
/// UIs can render options in a stable order.
///
/// # Examples
///
/// ```
/// use rfs_core::{ParamKind, ParamSchema};
///
/// let schema = ParamSchema::new()
///     .text("host")
///     .numeric("port")
///     .text("username")
///     .secret("password");
///
/// assert_eq!(schema.kind("password"), Some(ParamKind::Secret));
/// assert_eq!(schema.kind("nope"), None);
/// assert_eq!(schema.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchema {
    entries: Vec<(String, ParamKind)>,
}

impl ParamSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the schema every protocol shares: the tuning options.
    ///
    /// Concrete protocols extend this with their backend fields.
    #[must_use]
    pub fn with_tuning() -> Self {
        Self::new()
            .numeric("parallel")
            .boolean("polling")
            .numeric("polling_interval_ms")
    }

    /// Declares a numeric option.
    #[must_use]
    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Numeric)
    }

    /// Declares a boolean option.
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Boolean)
    }

    /// Declares a free-text option.
    #[must_use]
    pub fn text(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Text)
    }

    /// Declares a secret option.
    #[must_use]
    pub fn secret(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Secret)
    }

    /// Declares an option with an explicit kind.
    #[must_use]
    pub fn declare(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.entries.push((name.into(), kind));
        self
    }

    /// Returns the kind of a declared option, or `None` if undeclared.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<ParamKind> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, kind)| kind)
    }

    /// Returns the declared option names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the number of declared options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no options are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameters for reaching one backend target.
///
/// The backend fields (`protocol`, `host`, `port`, `username`,
/// `password`) determine [`ClientIdentity`](crate::ClientIdentity);
/// the tuning fields (`pool`, `watch`) never do.
///
/// # Examples
///
/// ```
/// use rfs_core::ConnectionParams;
///
/// let params = ConnectionParams::new("sftp", "files.example.com")
///     .with_port(22)
///     .with_credentials("deploy", "hunter2");
///
/// assert_eq!(params.protocol, "sftp");
/// assert_eq!(params.port, 22);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Protocol tag selecting the backend plugin.
    pub protocol: String,

    /// Remote host name or address.
    pub host: String,

    /// Remote port; `0` means the protocol default.
    pub port: u16,

    /// Account name, empty when the protocol needs none.
    pub username: String,

    /// Account secret, empty when the protocol needs none.
    pub password: String,

    /// Connection pool tuning. Excluded from identity.
    pub pool: PoolConfig,

    /// Polling watcher tuning. Excluded from identity.
    pub watch: WatchConfig,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            protocol: String::new(),
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            pool: PoolConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl ConnectionParams {
    /// Creates parameters for the given protocol and host, with all
    /// other fields at their defaults.
    #[must_use]
    pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    /// Sets the remote port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username and password.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the pool tuning.
    #[must_use]
    pub const fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the watch tuning.
    #[must_use]
    pub const fn with_watch(mut self, watch: WatchConfig) -> Self {
        self.watch = watch;
        self
    }

    /// Sets the parallelism, keeping the rest of the pool tuning.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: usize) -> Self {
        self.pool.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declaration_order() {
        let schema = ParamSchema::new().text("host").numeric("port");
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["host", "port"]);
    }

    #[test]
    fn test_schema_with_tuning() {
        let schema = ParamSchema::with_tuning();
        assert_eq!(schema.kind("parallel"), Some(ParamKind::Numeric));
        assert_eq!(schema.kind("polling"), Some(ParamKind::Boolean));
        assert_eq!(schema.kind("polling_interval_ms"), Some(ParamKind::Numeric));
    }

    #[test]
    fn test_param_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ParamKind::Secret).unwrap(),
            r#""secret""#
        );
        assert_eq!(
            serde_json::to_string(&ParamKind::Numeric).unwrap(),
            r#""numeric""#
        );
    }

    #[test]
    fn test_params_builder() {
        let params = ConnectionParams::new("ftp", "example.com")
            .with_port(21)
            .with_credentials("anonymous", "")
            .with_parallel(4);
        assert_eq!(params.protocol, "ftp");
        assert_eq!(params.host, "example.com");
        assert_eq!(params.port, 21);
        assert_eq!(params.username, "anonymous");
        assert_eq!(params.pool.parallel, 4);
    }

    #[test]
    fn test_params_deserialize_with_missing_fields() {
        let json = r#"{"protocol": "sftp", "host": "h"}"#;
        let params: ConnectionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.protocol, "sftp");
        assert_eq!(params.pool.parallel, 2);
        assert!(!params.watch.polling);
    }
}
