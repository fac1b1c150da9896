//! Backend selector.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Which encryption/storage strategy a secret uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    /// Identity transform, nothing persisted.
    None,
    /// AES-256-GCM under a process-local key.
    LocalKey,
    /// Vault transit encryption, optionally persisted in Vault KV.
    Vault,
}

impl BackendKind {
    /// Every known backend.
    pub const ALL: [BackendKind; 3] = [Self::None, Self::LocalKey, Self::Vault];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LocalKey => "local-key",
            Self::Vault => "vault",
        }
    }

    /// Whether secrets on this backend must name a key.
    pub fn requires_key(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for BackendKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "local-key" | "localkey" => Ok(Self::LocalKey),
            "vault" => Ok(Self::Vault),
            other => Err(ValidationError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
