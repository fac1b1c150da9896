//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// Backend-specific key identifier (local key file name or transit key).
pub type KeyName = String;

/// Path of a persisted ciphertext inside the external store.
pub type StoragePath = String;

/// Lowercase hex digest over raw ciphertext bytes.
pub type Signature = String;

/// Raw ciphertext bytes as produced by a backend, before transport encoding.
pub type RawCipher = Vec<u8>;
