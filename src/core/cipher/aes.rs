//! AES-256-GCM sealing with a random nonce prefixed to the output.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::{CryptoRng, RngCore};
use tracing::trace;
use zeroize::Zeroizing;

use crate::core::constants::{AES_KEY_LEN, NONCE_LEN};
use crate::core::types::RawCipher;
use crate::error::{BackendError, Result};

/// 256-bit AES key, wiped on drop.
pub type AesKey = Zeroizing<[u8; AES_KEY_LEN]>;

/// Generate a fresh random key.
pub fn generate_key<R: RngCore + CryptoRng>(rng: &mut R) -> AesKey {
    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    rng.fill_bytes(key.as_mut_slice());
    key
}

/// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
///
/// A new nonce is drawn from `rng` on every call, so sealing the same
/// plaintext twice never yields the same bytes.
pub fn seal<R: RngCore + CryptoRng>(
    key: &AesKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<RawCipher> {
    trace!(plaintext_len = plaintext.len(), "sealing");

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| BackendError::EncryptionFailed(format!("invalid key: {}", e)))?;

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| BackendError::EncryptionFailed("aes-gcm seal failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse [`seal`].
///
/// # Errors
///
/// Returns `BackendError::DecryptionFailed` if the input is truncated, was
/// sealed under another key, or has been modified.
pub fn open(key: &AesKey, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    trace!(ciphertext_len = sealed.len(), "opening");

    if sealed.len() < NONCE_LEN {
        return Err(BackendError::DecryptionFailed("ciphertext too short".to_string()).into());
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| BackendError::DecryptionFailed(format!("invalid key: {}", e)))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| {
            BackendError::DecryptionFailed("wrong key or corrupt ciphertext".to_string()).into()
        })
}
