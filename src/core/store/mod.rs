//! External key management and storage.
//!
//! The `vault` backend talks to two services: a transit engine that
//! encrypts and decrypts without handing out keys, and a key-value store
//! that persists ciphertext for namespaced instances. Both are traits so the
//! backend can run against a real Vault over HTTP or an in-process store.
//!
//! ## Adding a New Store
//!
//! 1. Implement [`Transit`] and/or [`KvStore`]
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::Result;

mod http;
mod memory;

pub use http::{spawn_token_renewal, VaultClient};
pub use memory::MemoryVault;

/// Remote encryption-as-a-service.
#[async_trait]
pub trait Transit: Send + Sync {
    /// Encrypt `plaintext` under the named key, returning the engine's
    /// ciphertext string.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the engine refuses the request, or
    /// `StorageError::Unavailable` if it cannot be reached.
    async fn encrypt(&self, key_name: &str, plaintext: &[u8]) -> Result<String>;

    /// Decrypt a ciphertext string previously returned by [`Transit::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the ciphertext or key is not
    /// accepted, or `StorageError::Unavailable` if the engine cannot be reached.
    async fn decrypt(&self, key_name: &str, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>>;
}

/// Persistent ciphertext storage addressed by path.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store `cipher_text` at `path`, replacing any previous value.
    async fn write(&self, path: &str, cipher_text: &str) -> Result<()>;

    /// Read the value stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored there.
    async fn read(&self, path: &str) -> Result<String>;

    /// Remove the value at `path`. Removing a missing path succeeds.
    async fn delete(&self, path: &str) -> Result<()>;
}
