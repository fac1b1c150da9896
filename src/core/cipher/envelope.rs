//! Cipher envelope codec.
//!
//! Turns raw backend ciphertext into its transport form and back, and
//! computes the integrity signature. The signature is always taken over the
//! raw bytes, never over their base64 text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::core::types::{RawCipher, Signature};
use crate::error::{Error, Result, ValidationError};

/// Hex MD5 digest of the raw ciphertext bytes.
pub fn sign(raw: &[u8]) -> Signature {
    format!("{:x}", md5::compute(raw))
}

/// Check a presented signature against the raw ciphertext.
///
/// Comparison is case-insensitive and does not short-circuit on the first
/// differing byte.
///
/// # Errors
///
/// Returns `Error::SignatureMismatch` if the digests differ.
pub fn verify(raw: &[u8], signature: &str) -> Result<()> {
    let expected = sign(raw);
    let presented = signature.trim().to_ascii_lowercase();

    if constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
        Ok(())
    } else {
        Err(Error::SignatureMismatch)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Base64 transport form of raw ciphertext.
pub fn encode(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Recover raw ciphertext from its transport form.
///
/// # Errors
///
/// Returns `ValidationError::InvalidCipherText` if `cipher_text` is not base64.
pub fn decode(cipher_text: &str) -> Result<RawCipher> {
    STANDARD
        .decode(cipher_text.trim())
        .map_err(|_| ValidationError::InvalidCipherText.into())
}

/// Interpret a submitted `clearText` value.
///
/// Valid padded base64 is decoded to bytes; any other value is taken as its
/// UTF-8 bytes. Four-letter words and similar text that parse as base64 are
/// decoded as well.
pub fn decode_clear_text(clear_text: &str) -> Zeroizing<Vec<u8>> {
    match STANDARD.decode(clear_text) {
        Ok(bytes) if !clear_text.is_empty() => Zeroizing::new(bytes),
        _ => Zeroizing::new(clear_text.as_bytes().to_vec()),
    }
}
