//! `vault` backend: transit encryption with optional KV persistence.
//!
//! The raw ciphertext is the transit engine's ciphertext string. Instances
//! configured with a storage namespace persist it in the KV store at
//! `{storage_dir}/v1-secrets/{sha256(raw)}` and hand that path back in place
//! of the ciphertext. Paths outside the instance's namespace are refused.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use super::{envelope, Sealed};
use crate::core::constants::API_VERSION;
use crate::core::store::{KvStore, Transit};
use crate::core::types::RawCipher;
use crate::error::{BackendError, Result, ValidationError};

/// Vault backend over any transit engine and KV store.
#[derive(Clone)]
pub struct Vault {
    transit: Arc<dyn Transit>,
    kv: Arc<dyn KvStore>,
    prefix: Option<String>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Where a submitted `cipherText` points.
enum Location<'a> {
    Inline(&'a str),
    Stored(&'a str),
}

impl Vault {
    /// Build the backend. An empty or missing `storage_dir` disables
    /// persistence and ciphertext travels inline as base64.
    pub fn new(
        transit: Arc<dyn Transit>,
        kv: Arc<dyn KvStore>,
        storage_dir: Option<&str>,
    ) -> Self {
        let prefix = storage_dir
            .map(|d| d.trim_matches('/'))
            .filter(|d| !d.is_empty())
            .map(|d| format!("{}/{}/", d, API_VERSION));
        Self {
            transit,
            kv,
            prefix,
        }
    }

    /// Path prefix every stored secret of this instance starts with.
    pub fn storage_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub async fn encrypt(&self, plaintext: &[u8], key_name: &str) -> Result<Sealed> {
        let ciphertext = self.transit.encrypt(key_name, plaintext).await?;
        let raw = ciphertext.into_bytes();

        let Some(prefix) = &self.prefix else {
            debug!(key_name, "vault encrypt, inline ciphertext");
            return Ok(Sealed {
                raw,
                storage_path: None,
            });
        };

        let path = format!("{}{:x}", prefix, Sha256::digest(&raw));
        let stored = std::str::from_utf8(&raw)
            .map_err(|_| BackendError::MalformedResponse("ciphertext is not utf-8".into()))?;
        self.kv.write(&path, stored).await?;
        debug!(key_name, path = %path, "vault encrypt, stored ciphertext");

        Ok(Sealed {
            raw,
            storage_path: Some(path),
        })
    }

    /// Recover the raw transit ciphertext a `cipherText` refers to.
    pub async fn load(&self, cipher_text: &str) -> Result<RawCipher> {
        match self.locate(cipher_text)? {
            Location::Inline(text) => envelope::decode(text),
            Location::Stored(path) => Ok(self.kv.read(path).await?.into_bytes()),
        }
    }

    pub async fn decrypt(&self, raw: &[u8], key_name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext = std::str::from_utf8(raw)
            .map_err(|_| BackendError::DecryptionFailed("not a transit ciphertext".into()))?;
        self.transit.decrypt(key_name, ciphertext).await
    }

    /// Remove a stored secret. Returns whether anything was stored.
    pub async fn delete(&self, cipher_text: &str) -> Result<bool> {
        match self.locate(cipher_text)? {
            Location::Inline(_) => Ok(false),
            Location::Stored(path) => {
                self.kv.delete(path).await?;
                debug!(path, "purged stored secret");
                Ok(true)
            }
        }
    }

    fn locate<'a>(&self, cipher_text: &'a str) -> Result<Location<'a>> {
        let cipher_text = cipher_text.trim();
        match &self.prefix {
            Some(prefix) if cipher_text.starts_with(prefix.as_str()) => {
                let hash = &cipher_text[prefix.len()..];
                if hash.is_empty() || hash.contains('/') {
                    return Err(ValidationError::ForeignStoragePath.into());
                }
                Ok(Location::Stored(cipher_text))
            }
            // a path into some other namespace
            _ if looks_like_path(cipher_text) => Err(ValidationError::ForeignStoragePath.into()),
            _ => Ok(Location::Inline(cipher_text)),
        }
    }
}

fn looks_like_path(text: &str) -> bool {
    text.contains(&format!("/{}/", API_VERSION)) || text.starts_with(&format!("{}/", API_VERSION))
}
