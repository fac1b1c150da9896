//! Secret service: create, rewrap and purge over the configured backends.
//!
//! Each operation validates the whole payload before touching a backend.
//! Bulk elements then run concurrently; the first failure fails the call and
//! the response keeps request order.

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::core::cipher::{envelope, Backends, RewrapKey};
use crate::core::domain::{BackendKind, BulkSecret, Payload, PurgeAck, Secret};
use crate::core::rewrap;
use crate::core::validation::{validate_payload, Operation};
use crate::error::{Result, ValidationError};

/// Orchestrates secret operations. Shared across request handlers.
#[derive(Debug, Clone, Default)]
pub struct SecretService {
    backends: Backends,
}

impl SecretService {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Validate `payload` and confirm every backend it names is configured.
    fn validate(&self, payload: &Payload, op: Operation) -> Result<Vec<BackendKind>> {
        let kinds = validate_payload(payload, op)?;
        for kind in &kinds {
            self.backends.get(*kind)?;
        }
        Ok(kinds)
    }

    /// Encrypt every secret in `payload`.
    ///
    /// Returned records have `clearText` emptied and `cipherText`,
    /// `signature` and (for persisted secrets) `storagePath` set.
    ///
    /// # Errors
    ///
    /// Returns the first validation, backend or storage error.
    pub async fn create(&self, payload: Payload) -> Result<Payload> {
        let kinds = self.validate(&payload, Operation::Create)?;
        debug!(count = kinds.len(), "create");

        match payload {
            Payload::Single(secret) => Ok(Payload::Single(self.create_one(secret, kinds[0]).await?)),
            Payload::Bulk(bulk) => {
                let data = try_join_all(
                    bulk.data
                        .into_iter()
                        .zip(kinds)
                        .map(|(secret, kind)| self.create_one(secret, kind)),
                )
                .await?;
                info!(count = data.len(), "bulk create");
                Ok(Payload::Bulk(BulkSecret::new(data)))
            }
        }
    }

    async fn create_one(&self, mut secret: Secret, kind: BackendKind) -> Result<Secret> {
        let backend = self.backends.get(kind)?;
        let plaintext = secret.take_plaintext();

        let sealed = backend.encrypt(&plaintext, &secret.key_name).await?;
        secret.signature = envelope::sign(&sealed.raw);
        secret.cipher_text = sealed.cipher_text();
        secret.storage_path = sealed.storage_path;
        Ok(secret)
    }

    /// Re-encrypt every secret in `payload` under the caller's public key.
    ///
    /// A single secret carries its own `rewrapKey`; a bulk payload carries one
    /// top-level `rewrapKey` for all elements.
    ///
    /// # Errors
    ///
    /// Returns `Error::SignatureMismatch` if any signature fails to verify,
    /// or the first validation, backend or storage error.
    pub async fn rewrap(&self, payload: Payload) -> Result<Payload> {
        let kinds = self.validate(&payload, Operation::Rewrap)?;
        debug!(count = kinds.len(), "rewrap");

        match payload {
            Payload::Single(secret) => {
                let key = parse_rewrap_key(&secret.rewrap_key)?;
                let backend = self.backends.get(kinds[0])?;
                Ok(Payload::Single(rewrap::rewrap(backend, secret, &key).await?))
            }
            Payload::Bulk(bulk) => {
                let key = parse_rewrap_key(&bulk.rewrap_key)?;
                let data = try_join_all(bulk.data.into_iter().zip(kinds).map(
                    |(secret, kind)| {
                        let key = &key;
                        async move {
                            let backend = self.backends.get(kind)?;
                            rewrap::rewrap(backend, secret, key).await
                        }
                    },
                ))
                .await?;
                info!(count = data.len(), "bulk rewrap");
                Ok(Payload::Bulk(BulkSecret::new(data)))
            }
        }
    }

    /// Permanently delete every persisted secret in `payload`.
    ///
    /// Secrets on backends without persistence are acknowledged without
    /// side effects.
    ///
    /// # Errors
    ///
    /// Returns the first validation or storage error.
    pub async fn purge(&self, payload: Payload) -> Result<PurgeAck> {
        let kinds = self.validate(&payload, Operation::Purge)?;

        let removed = try_join_all(payload.secrets().iter().zip(kinds).map(
            |(secret, kind)| async move {
                let backend = self.backends.get(kind)?;
                backend.delete(&secret.cipher_text).await
            },
        ))
        .await?;

        let count = removed.len();
        info!(
            count,
            removed = removed.iter().filter(|r| **r).count(),
            "purge"
        );
        Ok(PurgeAck::new(count))
    }
}

fn parse_rewrap_key(pem: &str) -> Result<RewrapKey> {
    if pem.trim().is_empty() {
        return Err(ValidationError::MissingField("rewrapKey").into());
    }
    RewrapKey::from_pem(pem)
}

