//! Encryption backends.
//!
//! Every secret names the backend that protects it. A backend turns
//! plaintext into raw ciphertext bytes, and reverses that for rewrap:
//!
//! - **none**: identity transform, nothing persisted.
//! - **local-key**: AES-256-GCM under a key from the local [`KeyRing`].
//! - **vault**: Vault transit encryption, optionally persisted in Vault KV
//!   under the instance's storage namespace.
//!
//! The [`envelope`] codec turns raw ciphertext into its transport form and
//! signs it. [`Backends`] is the table the service selects from.
//!
//! ## Adding a New Backend
//!
//! 1. Add a [`BackendKind`] variant and its wire name
//! 2. Implement encrypt/load/decrypt/delete in a new file
//! 3. Add a [`Backend`] variant dispatching to it

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};
use zeroize::Zeroizing;

pub mod aes;
pub mod envelope;
pub mod keyring;
mod local_key;
mod rewrap;
mod vault;

pub use keyring::KeyRing;
pub use local_key::LocalKey;
pub use rewrap::RewrapKey;
pub use vault::Vault;

use crate::core::config::Config;
use crate::core::domain::BackendKind;
use crate::core::store::{spawn_token_renewal, VaultClient};
use crate::core::types::{RawCipher, StoragePath};
use crate::error::{BackendError, Result};

/// Result of encrypting one plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Raw ciphertext bytes; the signature is computed over these.
    pub raw: RawCipher,
    /// Where the ciphertext was persisted, if anywhere.
    pub storage_path: Option<StoragePath>,
}

impl Sealed {
    /// The `cipherText` handed back to callers: the storage path for
    /// persisted secrets, otherwise base64 of the raw bytes.
    pub fn cipher_text(&self) -> String {
        match &self.storage_path {
            Some(path) => path.clone(),
            None => envelope::encode(&self.raw),
        }
    }
}

/// A configured encryption backend.
#[derive(Debug, Clone)]
pub enum Backend {
    None,
    LocalKey(LocalKey),
    Vault(Vault),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::None => BackendKind::None,
            Self::LocalKey(_) => BackendKind::LocalKey,
            Self::Vault(_) => BackendKind::Vault,
        }
    }

    /// Protect `plaintext` under `key_name`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if encryption fails, or `StorageError` if the
    /// external store cannot be reached.
    pub async fn encrypt(&self, plaintext: &[u8], key_name: &str) -> Result<Sealed> {
        match self {
            Self::None => Ok(Sealed {
                raw: plaintext.to_vec(),
                storage_path: None,
            }),
            Self::LocalKey(backend) => Ok(Sealed {
                raw: backend.encrypt(plaintext, key_name)?,
                storage_path: None,
            }),
            Self::Vault(backend) => backend.encrypt(plaintext, key_name).await,
        }
    }

    /// Recover raw ciphertext bytes from a submitted `cipherText`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for undecodable or foreign input, or
    /// `StorageError::NotFound` if a stored path no longer exists.
    pub async fn load(&self, cipher_text: &str) -> Result<RawCipher> {
        match self {
            Self::None | Self::LocalKey(_) => envelope::decode(cipher_text),
            Self::Vault(backend) => backend.load(cipher_text).await,
        }
    }

    /// Reverse [`Backend::encrypt`] given the raw ciphertext.
    pub async fn decrypt(&self, raw: &[u8], key_name: &str) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::None => Ok(Zeroizing::new(raw.to_vec())),
            Self::LocalKey(backend) => backend.decrypt(raw, key_name),
            Self::Vault(backend) => backend.decrypt(raw, key_name).await,
        }
    }

    /// Permanently remove a persisted secret.
    ///
    /// Returns whether anything was removed; backends without persistence
    /// always return `false`.
    pub async fn delete(&self, cipher_text: &str) -> Result<bool> {
        match self {
            Self::None | Self::LocalKey(_) => Ok(false),
            Self::Vault(backend) => backend.delete(cipher_text).await,
        }
    }
}

/// Backends available to this instance, keyed by kind.
#[derive(Debug, Clone)]
pub struct Backends {
    table: BTreeMap<BackendKind, Backend>,
}

impl Default for Backends {
    fn default() -> Self {
        Self::new()
    }
}

impl Backends {
    /// A table holding only the `none` backend.
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        table.insert(BackendKind::None, Backend::None);
        Self { table }
    }

    /// Add or replace a backend.
    pub fn with(mut self, backend: Backend) -> Self {
        self.table.insert(backend.kind(), backend);
        self
    }

    /// Build the table described by `config`.
    ///
    /// Loads the local key ring and connects the Vault client as configured.
    /// When the Vault token carries a storage namespace and none is
    /// configured, discovery fills it in. Starts token renewal if enabled, so
    /// this must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable key material or incomplete Vault
    /// settings, or `StorageError` if namespace discovery fails.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut backends = Self::new();

        if let Some(path) = &config.local_key.path {
            let keys = KeyRing::load(path)?;
            info!(path = %path.display(), keys = keys.len(), "local-key backend enabled");
            backends = backends.with(Backend::LocalKey(LocalKey::new(keys)));
        }

        if config.vault.is_enabled() {
            let client = Arc::new(VaultClient::new(&config.vault)?);

            let mut storage_dir = config.vault.storage_dir.clone().filter(|d| !d.is_empty());
            if storage_dir.is_none() && config.vault.discover_storage_dir {
                storage_dir = client.lookup_storage_dir().await?;
            }

            let backend = Vault::new(client.clone(), client.clone(), storage_dir.as_deref());
            info!(
                url = config.vault.url.as_deref().unwrap_or_default(),
                storage_prefix = backend.storage_prefix().unwrap_or("<inline>"),
                "vault backend enabled"
            );

            if config.vault.renew_interval_secs > 0 {
                spawn_token_renewal(client, config.vault.renew_interval());
            }
            backends = backends.with(Backend::Vault(backend));
        }

        debug!(backends = ?backends.kinds(), "backend table ready");
        Ok(backends)
    }

    /// Backend for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotConfigured` if this instance does not run it.
    pub fn get(&self, kind: BackendKind) -> Result<&Backend> {
        self.table
            .get(&kind)
            .ok_or_else(|| BackendError::NotConfigured(kind).into())
    }

    /// Kinds available, in stable order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.table.keys().copied().collect()
    }
}
