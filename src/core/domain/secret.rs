//! Secret record types.
//!
//! [`Secret`] is the single record shape that flows through create, rewrap
//! and purge. [`BulkSecret`] is its array form, and [`Payload`] is the
//! resolved single-or-bulk envelope the service works on.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::BackendKind;
use crate::core::cipher::envelope;
use crate::core::types::{KeyName, Signature, StoragePath};
use crate::error::ValidationError;

const SECRET_TYPE: &str = "secret";
const BULK_SECRET_TYPE: &str = "bulkSecret";
const PURGE_TYPE: &str = "purge";

fn secret_type() -> String {
    SECRET_TYPE.to_string()
}

fn bulk_secret_type() -> String {
    BULK_SECRET_TYPE.to_string()
}

/// A secret as submitted by and returned to callers.
///
/// `clear_text` is always serialized, and always empty once the service has
/// processed the record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(rename = "type", default = "secret_type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub key_name: KeyName,
    #[serde(default)]
    pub clear_text: String,
    #[serde(default)]
    pub cipher_text: String,
    #[serde(default)]
    pub signature: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<StoragePath>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rewrap_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rewrap_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_algorithm: String,
}

impl Secret {
    /// Create a secret to be protected by `backend` under `key_name`.
    pub fn new(
        backend: BackendKind,
        key_name: impl Into<KeyName>,
        clear_text: impl Into<String>,
    ) -> Self {
        Self {
            kind: secret_type(),
            backend: backend.name().to_string(),
            key_name: key_name.into(),
            clear_text: clear_text.into(),
            ..Self::default()
        }
    }

    /// Parsed backend selector.
    pub fn backend_kind(&self) -> Result<BackendKind, ValidationError> {
        self.backend.parse()
    }

    /// Move the plaintext out of the record, leaving `clear_text` empty.
    ///
    /// Base64 input is decoded; anything else is taken as UTF-8 text. A plain
    /// word that happens to be valid padded base64 (`"test"`, `"abcd"`) is
    /// therefore decoded too, so callers protecting arbitrary text should
    /// submit it base64-encoded.
    pub fn take_plaintext(&mut self) -> Zeroizing<Vec<u8>> {
        let clear_text = Zeroizing::new(std::mem::take(&mut self.clear_text));
        envelope::decode_clear_text(&clear_text)
    }

    /// Drop everything a rewrap response must not carry.
    pub(crate) fn clear_for_rewrap_response(&mut self) {
        self.clear_text.clear();
        self.cipher_text.clear();
        self.rewrap_key.clear();
        self.signature.clear();
        self.storage_path = None;
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("key_name", &self.key_name)
            .field("clear_text", &format_args!("<{} bytes>", self.clear_text.len()))
            .field("cipher_text", &self.cipher_text)
            .field("signature", &self.signature)
            .field("storage_path", &self.storage_path)
            .finish_non_exhaustive()
    }
}

/// Array form of [`Secret`] used with `?action=bulk`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSecret {
    #[serde(rename = "type", default = "bulk_secret_type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<Secret>,
    /// Public key applied to every element of a bulk rewrap.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rewrap_key: String,
}

impl BulkSecret {
    /// Wrap a list of secrets.
    pub fn new(data: Vec<Secret>) -> Self {
        Self {
            kind: bulk_secret_type(),
            data,
            rewrap_key: String::new(),
        }
    }
}

/// A request body resolved once at the boundary into its single or bulk form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Single(Secret),
    Bulk(BulkSecret),
}

impl Payload {
    /// Number of secrets carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Bulk(bulk) => bulk.data.len(),
        }
    }

    /// Whether no secrets are carried (only possible for bulk).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow every secret in request order.
    pub fn secrets(&self) -> &[Secret] {
        match self {
            Self::Single(secret) => std::slice::from_ref(secret),
            Self::Bulk(bulk) => &bulk.data,
        }
    }

    /// Unwrap a single payload.
    pub fn into_single(self) -> Option<Secret> {
        match self {
            Self::Single(secret) => Some(secret),
            Self::Bulk(_) => None,
        }
    }

    /// Unwrap a bulk payload.
    pub fn into_bulk(self) -> Option<BulkSecret> {
        match self {
            Self::Single(_) => None,
            Self::Bulk(bulk) => Some(bulk),
        }
    }
}

/// Acknowledgement returned by purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeAck {
    #[serde(rename = "type")]
    pub kind: String,
    pub purged: usize,
}

impl PurgeAck {
    /// Acknowledge `purged` secrets.
    pub fn new(purged: usize) -> Self {
        Self {
            kind: PURGE_TYPE.to_string(),
            purged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_deserializes_with_defaults() {
        let secret: Secret =
            serde_json::from_str(r#"{"clearText":"hello","backend":"none"}"#).unwrap();
        assert_eq!(secret.kind, "secret");
        assert_eq!(secret.backend_kind().unwrap(), BackendKind::None);
        assert!(secret.key_name.is_empty());
    }

    #[test]
    fn test_secret_always_serializes_clear_and_cipher_text() {
        let json = serde_json::to_value(Secret::new(BackendKind::None, "", "")).unwrap();
        assert_eq!(json["clearText"], "");
        assert_eq!(json["cipherText"], "");
        assert!(json.get("rewrapKey").is_none());
        assert!(json.get("rewrapText").is_none());
        assert!(json.get("storagePath").is_none());
    }

    #[test]
    fn test_take_plaintext_clears_field() {
        let mut secret = Secret::new(BackendKind::None, "", "aGVsbG8=");
        let plaintext = secret.take_plaintext();
        assert_eq!(plaintext.as_slice(), b"hello");
        assert!(secret.clear_text.is_empty());
    }

    #[test]
    fn test_take_plaintext_decodes_base64_shaped_words() {
        let mut secret = Secret::new(BackendKind::None, "", "test");
        assert_eq!(secret.take_plaintext().as_slice(), &[0xb5, 0xeb, 0x2d]);

        let mut secret = Secret::new(BackendKind::None, "", "hello");
        assert_eq!(secret.take_plaintext().as_slice(), b"hello");
    }

    #[test]
    fn test_rewrap_response_drops_ciphertext_and_signature() {
        let mut secret = Secret::new(BackendKind::Vault, "app", "");
        secret.cipher_text = "secret/tenant-a/v1-secrets/abc".to_string();
        secret.signature = "5d41402abc4b2a76b9719d911017c592".to_string();
        secret.rewrap_key = "pem".to_string();
        secret.storage_path = Some(secret.cipher_text.clone());

        secret.clear_for_rewrap_response();
        assert!(secret.cipher_text.is_empty());
        assert!(secret.signature.is_empty());
        assert!(secret.rewrap_key.is_empty());
        assert!(secret.storage_path.is_none());
        assert_eq!(secret.key_name, "app");
    }

    #[test]
    fn test_debug_redacts_clear_text() {
        let secret = Secret::new(BackendKind::None, "", "super-secret-value");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("<18 bytes>"));
    }

    #[test]
    fn test_bulk_deserializes() {
        let bulk: BulkSecret = serde_json::from_str(
            r#"{"data":[{"clearText":"a","backend":"none"},{"clearText":"b","backend":"none"}],"rewrapKey":"k"}"#,
        )
        .unwrap();
        assert_eq!(bulk.kind, "bulkSecret");
        assert_eq!(bulk.data.len(), 2);
        assert_eq!(bulk.rewrap_key, "k");
    }

    #[test]
    fn test_payload_secrets_in_order() {
        let payload = Payload::Bulk(BulkSecret::new(vec![
            Secret::new(BackendKind::None, "", "first"),
            Secret::new(BackendKind::None, "", "second"),
        ]));
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.secrets()[0].clear_text, "first");
        assert_eq!(payload.secrets()[1].clear_text, "second");
        assert!(payload.into_single().is_none());
    }
}
