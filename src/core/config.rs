//! Service configuration.
//!
//! Read from an optional TOML file, then overridden by command-line flags and
//! environment variables:
//!
//! ```toml
//! [server]
//! listen_address = "0.0.0.0:8181"
//!
//! [local_key]
//! path = "/etc/secrets-api/keys"
//!
//! [vault]
//! url = "https://vault.internal:8200"
//! token = "..."
//! storage_dir = "secret/tenant-a"
//! renew_interval_secs = 3600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{
    DEFAULT_LISTEN_ADDRESS, DEFAULT_STORE_TIMEOUT_SECS, DEFAULT_TRANSIT_MOUNT,
};
use crate::error::{ConfigError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub local_key: LocalKeyConfig,
    pub vault: VaultConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
        }
    }
}

/// Local AES key material. The backend is enabled when `path` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalKeyConfig {
    /// A key file used for every key name, or a directory of key files named
    /// after their key names.
    pub path: Option<PathBuf>,
}

/// Vault connection. The backend is enabled when `url` is set.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Enterprise namespace sent as `X-Vault-Namespace`.
    pub namespace: Option<String>,
    /// KV path prefix isolating this instance's stored secrets. Unset means
    /// ciphertext is returned inline.
    pub storage_dir: Option<String>,
    /// Read `storage_dir` from the token metadata when it is not configured.
    pub discover_storage_dir: bool,
    pub transit_mount: String,
    pub timeout_secs: u64,
    /// Token renewal period; 0 disables renewal.
    pub renew_interval_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            namespace: None,
            storage_dir: None,
            discover_storage_dir: false,
            transit_mount: DEFAULT_TRANSIT_MOUNT.to_string(),
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            renew_interval_secs: 0,
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("namespace", &self.namespace)
            .field("storage_dir", &self.storage_dir)
            .field("discover_storage_dir", &self.discover_storage_dir)
            .field("transit_mount", &self.transit_mount)
            .field("timeout_secs", &self.timeout_secs)
            .field("renew_interval_secs", &self.renew_interval_secs)
            .finish()
    }
}

impl VaultConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn renew_interval(&self) -> Duration {
        Duration::from_secs(self.renew_interval_secs)
    }
}

impl Config {
    /// Configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TOML configuration file.
    ///
    /// Only parses; call [`Config::validate`] once overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read, or
    /// `ConfigError::Parse` if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(
            local_key = config.local_key.path.is_some(),
            vault = config.vault.is_enabled(),
            "config loaded"
        );
        Ok(config)
    }

    /// Check settings that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.listen_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "server.listen_address",
                reason: format!("'{}' is not a socket address", self.server.listen_address),
            }
            .into());
        }

        if self.vault.is_enabled() {
            if self.vault.token.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::InvalidValue {
                    field: "vault.token",
                    reason: "required when vault.url is set".to_string(),
                }
                .into());
            }
            if self.vault.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "vault.timeout_secs",
                    reason: "must be greater than zero".to_string(),
                }
                .into());
            }
            if self.vault.transit_mount.trim_matches('/').is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "vault.transit_mount",
                    reason: "cannot be empty".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
