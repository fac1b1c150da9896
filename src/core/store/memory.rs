//! In-process Vault stand-in.
//!
//! Implements the transit and KV traits with process-local state: one
//! AES-256-GCM key per transit key name, created on first use, and a map of
//! stored ciphertext. Useful for tests and for running the service without a
//! Vault server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use tracing::trace;
use zeroize::Zeroizing;

use super::{KvStore, Transit};
use crate::core::cipher::aes::{self, AesKey};
use crate::error::{BackendError, Result, StorageError};

const CIPHERTEXT_PREFIX: &str = "vault:v1:";

/// Memory-backed transit engine and KV store.
#[derive(Default)]
pub struct MemoryVault {
    keys: Mutex<HashMap<String, AesKey>>,
    kv: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `StorageError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub fn stored(&self) -> usize {
        lock(&self.kv).len()
    }

    fn check_available(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("memory vault is offline".to_string()).into())
        } else {
            Ok(())
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transit for MemoryVault {
    async fn encrypt(&self, key_name: &str, plaintext: &[u8]) -> Result<String> {
        self.check_available()?;
        let mut keys = lock(&self.keys);
        let key = keys
            .entry(key_name.to_string())
            .or_insert_with(|| aes::generate_key(&mut OsRng));
        let sealed = aes::seal(key, plaintext, &mut OsRng)?;
        trace!(key_name, "memory transit encrypt");
        Ok(format!("{}{}", CIPHERTEXT_PREFIX, STANDARD.encode(sealed)))
    }

    async fn decrypt(&self, key_name: &str, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.check_available()?;
        let keys = lock(&self.keys);
        let key = keys
            .get(key_name)
            .ok_or_else(|| BackendError::Rejected(format!("encryption key not found: {}", key_name)))?;
        let sealed = ciphertext
            .strip_prefix(CIPHERTEXT_PREFIX)
            .and_then(|b64| STANDARD.decode(b64).ok())
            .ok_or_else(|| BackendError::Rejected("invalid ciphertext".to_string()))?;
        aes::open(key, &sealed).map_err(|_| {
            BackendError::Rejected("cipher: message authentication failed".to_string()).into()
        })
    }
}

#[async_trait]
impl KvStore for MemoryVault {
    async fn write(&self, path: &str, cipher_text: &str) -> Result<()> {
        self.check_available()?;
        lock(&self.kv).insert(path.to_string(), cipher_text.to_string());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.check_available()?;
        lock(&self.kv)
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()).into())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.check_available()?;
        lock(&self.kv).remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_transit_roundtrip() {
        let vault = MemoryVault::new();
        let ct = vault.encrypt("app", b"hello").await.unwrap();
        assert!(ct.starts_with(CIPHERTEXT_PREFIX));
        let pt = vault.decrypt("app", &ct).await.unwrap();
        assert_eq!(pt.as_slice(), b"hello");
    }

    #[tokio::test]
    async fn test_transit_randomized() {
        let vault = MemoryVault::new();
        let a = vault.encrypt("app", b"same").await.unwrap();
        let b = vault.encrypt("app", b"same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_transit_wrong_key_rejected() {
        let vault = MemoryVault::new();
        let ct = vault.encrypt("app", b"hello").await.unwrap();
        vault.encrypt("other", b"x").await.unwrap();
        assert!(matches!(
            vault.decrypt("other", &ct).await,
            Err(Error::Backend(BackendError::Rejected(_)))
        ));
        assert!(matches!(
            vault.decrypt("missing", &ct).await,
            Err(Error::Backend(BackendError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_kv_read_after_delete_is_not_found() {
        let vault = MemoryVault::new();
        vault.write("ns/v1-secrets/abc", "vault:v1:xyz").await.unwrap();
        assert_eq!(vault.read("ns/v1-secrets/abc").await.unwrap(), "vault:v1:xyz");
        assert_eq!(vault.stored(), 1);

        vault.delete("ns/v1-secrets/abc").await.unwrap();
        assert!(matches!(
            vault.read("ns/v1-secrets/abc").await,
            Err(Error::Storage(StorageError::NotFound(_)))
        ));
        vault.delete("ns/v1-secrets/abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_is_unavailable() {
        let vault = MemoryVault::new();
        vault.set_available(false);
        let err = vault.encrypt("app", b"x").await.unwrap_err();
        assert!(err.is_retryable());
        vault.set_available(true);
        assert!(vault.encrypt("app", b"x").await.is_ok());
    }
}
