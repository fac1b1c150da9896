//! Rewrap: export a stored secret under a caller-supplied public key.
//!
//! ```text
//! Received ──▶ SignatureVerified ──▶ PlaintextRecovered ──▶ Reencrypted ──▶ Responded
//!    │
//!    └──▶ Rejected (signature mismatch)
//! ```
//!
//! The plaintext only exists between `PlaintextRecovered` and `Reencrypted`,
//! in zeroizing memory.

use std::fmt;

use tracing::{trace, warn};

use crate::core::cipher::{envelope, Backend, RewrapKey};
use crate::core::constants::REWRAP_HASH_ALGORITHM;
use crate::core::domain::Secret;
use crate::error::Result;

/// Progress of one secret through a rewrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SignatureVerified,
    PlaintextRecovered,
    Reencrypted,
    Responded,
    Rejected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::SignatureVerified => "signature_verified",
            Self::PlaintextRecovered => "plaintext_recovered",
            Self::Reencrypted => "reencrypted",
            Self::Responded => "responded",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Rewrap one validated secret.
///
/// On success the returned record carries `rewrapText` and `hashAlgorithm`
/// and has `clearText`, `cipherText`, `rewrapKey` and `storagePath` cleared.
///
/// # Errors
///
/// Returns `Error::SignatureMismatch` if the presented signature does not
/// match the stored ciphertext, or any load, decrypt or encrypt failure.
pub async fn rewrap(backend: &Backend, mut secret: Secret, key: &RewrapKey) -> Result<Secret> {
    let mut stage = Stage::Received;
    trace!(%stage, backend = %backend.kind(), "rewrap");

    let raw = backend.load(&secret.cipher_text).await?;
    if let Err(e) = envelope::verify(&raw, &secret.signature) {
        stage = Stage::Rejected;
        warn!(%stage, name = %secret.name, "rewrap signature mismatch");
        return Err(e);
    }
    stage = Stage::SignatureVerified;
    trace!(%stage);

    let plaintext = backend.decrypt(&raw, &secret.key_name).await?;
    stage = Stage::PlaintextRecovered;
    trace!(%stage, plaintext_len = plaintext.len());

    let rewrap_text = key.encrypt(&plaintext)?;
    drop(plaintext);
    stage = Stage::Reencrypted;
    trace!(%stage);

    secret.clear_for_rewrap_response();
    secret.rewrap_text = rewrap_text;
    secret.hash_algorithm = REWRAP_HASH_ALGORITHM.to_string();
    stage = Stage::Responded;
    trace!(%stage);

    Ok(secret)
}

