//! `local-key` backend: AES-256-GCM under a key from the local key ring.

use std::sync::Arc;

use rand::rngs::OsRng;
use tracing::debug;
use zeroize::Zeroizing;

use super::aes;
use super::keyring::KeyRing;
use crate::core::types::RawCipher;
use crate::error::Result;

/// Local AES backend.
#[derive(Debug, Clone)]
pub struct LocalKey {
    keys: Arc<KeyRing>,
}

impl LocalKey {
    pub fn new(keys: KeyRing) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    /// Seal `plaintext` under `key_name`. Output is `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8], key_name: &str) -> Result<RawCipher> {
        let key = self.keys.key(key_name)?;
        let raw = aes::seal(key, plaintext, &mut OsRng)?;
        debug!(key_name, raw_len = raw.len(), "local-key encrypt");
        Ok(raw)
    }

    pub fn decrypt(&self, raw: &[u8], key_name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.keys.key(key_name)?;
        aes::open(key, raw)
    }
}
