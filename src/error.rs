//! Error types.
//!
//! One crate-wide [`Error`] wraps a sub-enum per concern. Messages are safe to
//! hand back to callers: none of them carry plaintext or key material.

use thiserror::Error;

use crate::core::domain::BackendKind;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The signature presented for rewrap does not match the ciphertext.
    #[error("signature does not match ciphertext")]
    SignatureMismatch,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::SignatureMismatch => "SignatureMismatchError",
            Self::Backend(_) => "BackendError",
            Self::Storage(StorageError::NotFound(_)) => "NotFoundError",
            Self::Storage(_) => "StorageUnavailableError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "InternalError",
        }
    }

    /// Whether the failure was caused by the request rather than the service.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::SignatureMismatch => true,
            Self::Backend(e) => e.is_caller_error(),
            Self::Storage(e) => matches!(e, StorageError::NotFound(_)),
            Self::Config(_) | Self::Io(_) => false,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Unavailable(_)))
    }
}

/// Request validation failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unknown backend: {0}. Supported: none, local-key, vault")]
    UnknownBackend(String),

    #[error("keyName is required for the {0} backend")]
    MissingKeyName(BackendKind),

    #[error("invalid keyName '{name}': {reason}")]
    InvalidKeyName { name: String, reason: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("bulk request must contain at least one secret")]
    EmptyBulk,

    #[error("bulk request has {actual} secrets, the limit is {limit}")]
    BulkTooLarge { actual: usize, limit: usize },

    #[error("cipherText is not valid base64")]
    InvalidCipherText,

    #[error("cipherText path is outside this instance's storage namespace")]
    ForeignStoragePath,

    #[error("invalid rewrap key: {0}")]
    InvalidRewrapKey(String),

    #[error("secret of {len} bytes is too long to rewrap with this key (max {max})")]
    PlaintextTooLong { len: usize, max: usize },

    #[error("unsupported action '{0}', expected 'bulk'")]
    UnsupportedAction(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Encryption and decryption failures inside a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend not configured: {0}")]
    NotConfigured(BackendKind),

    #[error("no key named '{0}'")]
    UnknownKey(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The remote transit engine refused the request (bad key, bad ciphertext).
    #[error("transit engine rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response from backend: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether the failure is attributable to the request.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_)
                | Self::UnknownKey(_)
                | Self::DecryptionFailed(_)
                | Self::Rejected(_)
        )
    }
}

/// External key-value store failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no secret stored at {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Startup configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid key file {path}: {reason}")]
    InvalidKeyFile { path: String, reason: String },

    #[error("refusing to overwrite existing key file {0} (use --force)")]
    KeyFileExists(String),
}
