//! Canonical client identity.
//!
//! Two [`ConnectionParams`] that target the same backend must resolve
//! to the same client, however their tuning differs. [`ClientIdentity`]
//! is the canonical key: a deterministic JSON rendering of the
//! protocol tag and the backend fields only.

use serde::{Deserialize, Serialize};

use crate::params::ConnectionParams;

/// Canonical, deterministic key identifying a distinct backend target.
///
/// Derived from the protocol tag and backend-specific fields; tuning
/// fields (parallelism, polling) are excluded by construction.
///
/// # Examples
///
/// ```
/// use rfs_core::{ClientIdentity, ConnectionParams, PoolConfig};
///
/// let a = ConnectionParams::new("sftp", "host").with_port(22);
/// let b = a.clone().with_pool(PoolConfig { parallel: 16, ..PoolConfig::default() });
///
/// assert_eq!(ClientIdentity::from_params(&a), ClientIdentity::from_params(&b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

/// The identity-relevant subset of [`ConnectionParams`].
///
/// Serialized with `serde_json`, whose map rendering is deterministic,
/// so equal fields always produce byte-equal identities.
#[derive(Serialize)]
struct IdentityFields<'a> {
    protocol: &'a str,
    host: &'a str,
    port: u16,
    user: &'a str,
    password: &'a str,
}

impl ClientIdentity {
    /// Wraps an already-canonical identity string.
    ///
    /// Backend factories that derive identity from fields other than
    /// the standard ones use this directly.
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the canonical identity from the backend fields of
    /// `params`. Pure and deterministic; tuning fields are ignored.
    #[must_use]
    pub fn from_params(params: &ConnectionParams) -> Self {
        let fields = IdentityFields {
            protocol: &params.protocol,
            host: &params.host,
            port: params.port,
            user: &params.username,
            password: &params.password,
        };
        // Serializing a plain struct of strings and integers cannot fail.
        let key = serde_json::to_string(&fields).unwrap_or_default();
        Self(key)
    }

    /// Returns the canonical key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ConnectionParams> for ClientIdentity {
    fn from(params: &ConnectionParams) -> Self {
        Self::from_params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, WatchConfig};

    fn params() -> ConnectionParams {
        ConnectionParams::new("sftp", "files.example.com")
            .with_port(22)
            .with_credentials("deploy", "s3cret")
    }

    #[test]
    fn test_identity_is_deterministic() {
        assert_eq!(
            ClientIdentity::from_params(&params()),
            ClientIdentity::from_params(&params())
        );
    }

    #[test]
    fn test_identity_ignores_tuning() {
        let base = params();
        let tuned = base
            .clone()
            .with_pool(PoolConfig {
                parallel: 32,
                idle_timeout_ms: 1,
            })
            .with_watch(WatchConfig {
                polling: true,
                polling_interval_ms: 50,
            });
        assert_eq!(
            ClientIdentity::from_params(&base),
            ClientIdentity::from_params(&tuned)
        );
    }

    #[test]
    fn test_identity_distinguishes_backend_fields() {
        let base = params();
        let other_host = ConnectionParams::new("sftp", "other.example.com")
            .with_port(22)
            .with_credentials("deploy", "s3cret");
        let other_user = params().with_credentials("admin", "s3cret");

        assert_ne!(
            ClientIdentity::from_params(&base),
            ClientIdentity::from_params(&other_host)
        );
        assert_ne!(
            ClientIdentity::from_params(&base),
            ClientIdentity::from_params(&other_user)
        );
    }

    #[test]
    fn test_identity_distinguishes_protocols() {
        let sftp = params();
        let mut ftp = params();
        ftp.protocol = "ftp".to_owned();
        assert_ne!(
            ClientIdentity::from_params(&sftp),
            ClientIdentity::from_params(&ftp)
        );
    }

    #[test]
    fn test_identity_display_round_trip() {
        let id = ClientIdentity::from_params(&params());
        assert_eq!(id.to_string(), id.as_str());
        assert!(id.as_str().contains("files.example.com"));
    }
}
