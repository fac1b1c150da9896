//! Constants used throughout secrets-api.
//!
//! Centralizes magic strings and configuration values.

/// API version segment, also the root of every persisted storage path.
pub const API_VERSION: &str = "v1-secrets";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8181";

/// Default timeout for calls to the external store, in seconds.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Default Vault transit engine mount.
pub const DEFAULT_TRANSIT_MOUNT: &str = "transit";

/// Field under which ciphertext is stored at a KV path.
pub const KV_CIPHERTEXT_FIELD: &str = "cipherText";

/// Maximum number of secrets accepted in one bulk request.
pub const MAX_BULK_SECRETS: usize = 1000;

/// Maximum length of a key name.
pub const MAX_KEY_NAME_LEN: usize = 128;

/// AES-256 key length in bytes.
pub const AES_KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Hash algorithm reported on rewrap responses (the OAEP digest).
pub const REWRAP_HASH_ALGORITHM: &str = "sha256";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SECRETS_API_LOG";
