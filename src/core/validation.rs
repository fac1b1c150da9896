//! Request validation.
//!
//! Every element of a payload is checked before any backend work starts, so
//! a bad element fails the whole request without side effects.

use crate::core::constants::{MAX_BULK_SECRETS, MAX_KEY_NAME_LEN};
use crate::core::domain::{BackendKind, Payload, Secret};
use crate::error::{Result, ValidationError};

/// Service operation a payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Rewrap,
    Purge,
}

/// Validate a key name.
///
/// Key names address key files and transit keys, so they are restricted to
/// `A-Z a-z 0-9 _ . -`, must not start with a dot, and are bounded in length.
///
/// # Errors
///
/// Returns `ValidationError::InvalidKeyName` describing the first problem.
pub fn validate_key_name(name: &str) -> Result<()> {
    let invalid = |reason: String| ValidationError::InvalidKeyName {
        name: name.chars().take(MAX_KEY_NAME_LEN).collect(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("cannot be empty".to_string()).into());
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return Err(invalid(format!("longer than {} characters", MAX_KEY_NAME_LEN)).into());
    }
    if name.starts_with('.') {
        return Err(invalid("cannot start with '.'".to_string()).into());
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && !matches!(ch, '_' | '.' | '-') {
            return Err(invalid(format!(
                "invalid character '{}' at position {}. Only A-Z, a-z, 0-9, '_', '.' and '-' are allowed",
                ch,
                i + 1
            ))
            .into());
        }
    }

    Ok(())
}

/// Validate one secret for `op`, returning its backend.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_secret(secret: &Secret, op: Operation) -> Result<BackendKind> {
    let kind = secret.backend_kind()?;

    if kind.requires_key() {
        if secret.key_name.is_empty() {
            return Err(ValidationError::MissingKeyName(kind).into());
        }
        validate_key_name(&secret.key_name)?;
    }

    match op {
        Operation::Create => {
            if secret.clear_text.is_empty() {
                return Err(ValidationError::MissingField("clearText").into());
            }
        }
        Operation::Rewrap => {
            if secret.cipher_text.is_empty() {
                return Err(ValidationError::MissingField("cipherText").into());
            }
            if secret.signature.is_empty() {
                return Err(ValidationError::MissingField("signature").into());
            }
        }
        Operation::Purge => {
            if secret.cipher_text.is_empty() {
                return Err(ValidationError::MissingField("cipherText").into());
            }
        }
    }

    Ok(kind)
}

/// Validate a whole payload, returning the backend of each element in order.
///
/// # Errors
///
/// Returns `ValidationError::EmptyBulk` or `ValidationError::BulkTooLarge`
/// for bad bulk sizes, otherwise the first element error.
pub fn validate_payload(payload: &Payload, op: Operation) -> Result<Vec<BackendKind>> {
    if let Payload::Bulk(bulk) = payload {
        if bulk.data.is_empty() {
            return Err(ValidationError::EmptyBulk.into());
        }
        if bulk.data.len() > MAX_BULK_SECRETS {
            return Err(ValidationError::BulkTooLarge {
                actual: bulk.data.len(),
                limit: MAX_BULK_SECRETS,
            }
            .into());
        }
    }

    payload
        .secrets()
        .iter()
        .map(|secret| validate_secret(secret, op))
        .collect()
}
