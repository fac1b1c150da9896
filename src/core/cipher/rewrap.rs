//! RSA-OAEP encryption for exporting secrets under a caller's public key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use crate::error::{BackendError, Result, ValidationError};

/// SHA-256 output length, which sizes the OAEP padding.
const OAEP_HASH_LEN: usize = 32;

/// A parsed rewrap public key.
#[derive(Debug, Clone)]
pub struct RewrapKey(RsaPublicKey);

impl RewrapKey {
    /// Parse a PEM public key, either SPKI (`PUBLIC KEY`) or PKCS#1
    /// (`RSA PUBLIC KEY`).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRewrapKey` if neither form parses.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(ValidationError::MissingField("rewrapKey").into());
        }

        RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map(Self)
            .map_err(|_| {
                ValidationError::InvalidRewrapKey(
                    "expected a PEM encoded RSA public key".to_string(),
                )
                .into()
            })
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Longest plaintext this key can carry under OAEP with SHA-256.
    pub fn max_plaintext_len(&self) -> usize {
        self.0.size().saturating_sub(2 * OAEP_HASH_LEN + 2)
    }

    /// Encrypt `plaintext` with RSA-OAEP(SHA-256), returning base64.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PlaintextTooLong` if the plaintext exceeds
    /// [`RewrapKey::max_plaintext_len`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(ValidationError::PlaintextTooLong {
                len: plaintext.len(),
                max,
            }
            .into());
        }

        let ciphertext = self
            .0
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| BackendError::EncryptionFailed(format!("rsa-oaep: {}", e)))?;
        Ok(STANDARD.encode(ciphertext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::pkcs8::{EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;
    use std::sync::OnceLock;

    fn private_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).unwrap())
    }

    fn decrypt(b64: &str) -> Vec<u8> {
        let ciphertext = STANDARD.decode(b64).unwrap();
        private_key()
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .unwrap()
    }

    #[test]
    fn test_spki_pem_roundtrip() {
        let pem = private_key()
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        let key = RewrapKey::from_pem(&pem).unwrap();
        assert_eq!(key.bits(), 1024);
        assert_eq!(decrypt(&key.encrypt(b"hello").unwrap()), b"hello");
    }

    #[test]
    fn test_pkcs1_pem_accepted() {
        let pem = private_key()
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .unwrap();
        let key = RewrapKey::from_pem(&pem).unwrap();
        assert_eq!(decrypt(&key.encrypt(b"hello").unwrap()), b"hello");
    }

    #[test]
    fn test_invalid_pem_rejected() {
        assert!(matches!(
            RewrapKey::from_pem("-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----"),
            Err(crate::error::Error::Validation(
                ValidationError::InvalidRewrapKey(_)
            ))
        ));
        assert!(RewrapKey::from_pem("").is_err());
    }

    #[test]
    fn test_plaintext_limit() {
        let pem = private_key()
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        let key = RewrapKey::from_pem(&pem).unwrap();
        // 128 byte modulus - 2 * 32 - 2
        assert_eq!(key.max_plaintext_len(), 62);
        assert!(key.encrypt(&[b'a'; 62]).is_ok());
        assert!(matches!(
            key.encrypt(&[b'a'; 63]),
            Err(crate::error::Error::Validation(
                ValidationError::PlaintextTooLong { len: 63, max: 62 }
            ))
        ));
    }
}
