//! Keygen command - write a fresh local AES-256 key.

use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::core::cipher::keyring;
use crate::error::Result;

/// Generate a key file at `path`.
pub fn execute(path: &Path, force: bool) -> Result<()> {
    let written = keyring::write_key_file(path, force)?;
    info!(path = %written.display(), "wrote key file");

    output::success(&format!("wrote key to {}", output::path(written.display())));
    output::hint("serve it with: secrets-api server --enc-key-path <path>");
    Ok(())
}
