//! Process-local key material for the `local-key` backend.
//!
//! Keys are read once at startup and never change afterwards. The configured
//! path is either a single key file, used for every key name, or a directory
//! holding one file per key name.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::aes::{generate_key, AesKey};
use crate::core::validation::validate_key_name;
use crate::core::constants::AES_KEY_LEN;
use crate::error::{BackendError, ConfigError, Error, Result};

/// Immutable set of local AES keys.
pub enum KeyRing {
    /// One key serving every key name.
    Single(AesKey),
    /// Keys addressed by name.
    Named(BTreeMap<String, AesKey>),
}

impl KeyRing {
    /// Load key material from a file or directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKeyFile` if the path is missing or any
    /// key file does not hold a 256-bit key.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| ConfigError::InvalidKeyFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if !metadata.is_dir() {
            debug!(path = %path.display(), "loading single local key");
            return Ok(Self::Single(read_key_file(path)?));
        }

        let mut keys = BTreeMap::new();
        let entries = fs::read_dir(path).map_err(ConfigError::ReadFile)?;
        for entry in entries {
            let entry = entry.map_err(ConfigError::ReadFile)?;
            let file_path = entry.path();
            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if validate_key_name(name).is_err() {
                debug!(file = %file_path.display(), "skipping file with unusable key name");
                continue;
            }
            keys.insert(name.to_string(), read_key_file(&file_path)?);
        }

        debug!(path = %path.display(), keys = keys.len(), "loaded local key directory");
        Ok(Self::Named(keys))
    }

    /// Build a ring from in-memory keys.
    pub fn from_keys(keys: impl IntoIterator<Item = (String, AesKey)>) -> Self {
        Self::Named(keys.into_iter().collect())
    }

    /// Key registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::UnknownKey` if no such key exists.
    pub fn key(&self, name: &str) -> Result<&AesKey> {
        match self {
            Self::Single(key) => Ok(key),
            Self::Named(keys) => keys
                .get(name)
                .ok_or_else(|| BackendError::UnknownKey(name.to_string()).into()),
        }
    }

    /// Number of distinct keys held.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Named(keys) => keys.len(),
        }
    }

    /// Whether the ring holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("KeyRing::Single(<redacted>)"),
            Self::Named(keys) => f
                .debug_struct("KeyRing::Named")
                .field("names", &keys.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

fn read_key_file(path: &Path) -> Result<AesKey> {
    #[cfg(unix)]
    warn_if_readable_by_others(path);

    let contents = Zeroizing::new(fs::read(path).map_err(ConfigError::ReadFile)?);
    parse_key(&contents).ok_or_else(|| {
        ConfigError::InvalidKeyFile {
            path: path.display().to_string(),
            reason: format!(
                "expected {} raw bytes, {} hex characters, or base64 of {} bytes",
                AES_KEY_LEN,
                AES_KEY_LEN * 2,
                AES_KEY_LEN
            ),
        }
        .into()
    })
}

/// Decode key file contents in any of the accepted encodings.
fn parse_key(contents: &[u8]) -> Option<AesKey> {
    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);

    if contents.len() == AES_KEY_LEN {
        key.copy_from_slice(contents);
        return Some(key);
    }

    let text = std::str::from_utf8(contents).ok()?.trim();

    if text.len() == AES_KEY_LEN * 2 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&text[i * 2..i * 2 + 2], 16).ok()?;
        }
        return Some(key);
    }

    let decoded = Zeroizing::new(STANDARD.decode(text).ok()?);
    if decoded.len() == AES_KEY_LEN {
        key.copy_from_slice(&decoded);
        return Some(key);
    }

    None
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "key file is readable by other users, run: chmod 600"
            );
        }
    }
}

/// Write a freshly generated base64 key to `path` with mode 0600.
///
/// # Errors
///
/// Returns `ConfigError::KeyFileExists` if the file exists and `force` is
/// false, or an I/O error if the write fails.
pub fn write_key_file(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        return Err(ConfigError::KeyFileExists(path.display().to_string()).into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => {
            ConfigError::KeyFileExists(path.display().to_string()).into()
        }
        _ => Error::from(e),
    })?;

    // An overwritten file keeps its old mode; tighten it before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    let key = generate_key(&mut OsRng);
    let encoded = Zeroizing::new(format!("{}\n", STANDARD.encode(key.as_slice())));
    file.write_all(encoded.as_bytes())?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_raw_hex_and_base64() {
        let raw = [7u8; AES_KEY_LEN];
        assert_eq!(*parse_key(&raw).unwrap(), raw);

        let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(*parse_key(format!("{}\n", hex).as_bytes()).unwrap(), raw);

        let b64 = STANDARD.encode(raw);
        assert_eq!(*parse_key(b64.as_bytes()).unwrap(), raw);
    }

    #[test]
    fn test_parse_rejects_short_key() {
        assert!(parse_key(b"too short").is_none());
        assert!(parse_key(STANDARD.encode([1u8; 16]).as_bytes()).is_none());
    }

    #[test]
    fn test_single_file_serves_every_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        write_key_file(&path, false).unwrap();

        let ring = KeyRing::load(&path).unwrap();
        assert_eq!(ring.len(), 1);
        let a = ring.key("alpha").unwrap();
        let b = ring.key("beta").unwrap();
        assert_eq!(**a, **b);
    }

    #[test]
    fn test_directory_addresses_keys_by_name() {
        let dir = TempDir::new().unwrap();
        write_key_file(&dir.path().join("alpha"), false).unwrap();
        write_key_file(&dir.path().join("beta"), false).unwrap();

        let ring = KeyRing::load(dir.path()).unwrap();
        assert_eq!(ring.len(), 2);
        assert_ne!(**ring.key("alpha").unwrap(), **ring.key("beta").unwrap());
        assert!(ring.key("gamma").is_err());
    }

    #[test]
    fn test_load_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        assert!(KeyRing::load(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        write_key_file(&path, false).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        assert!(write_key_file(&path, false).is_err());
        write_key_file(&path, true).unwrap();
        assert_ne!(fs::read_to_string(&path).unwrap(), first);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_key_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        write_key_file(&path, false).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_forced_overwrite_tightens_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_key_file(&path, true).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(KeyRing::load(&path).is_ok());
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let ring = KeyRing::Single(Zeroizing::new([0xAB; AES_KEY_LEN]));
        let debug = format!("{:?}", ring);
        assert!(!debug.contains("171"));
        assert!(debug.contains("redacted"));
    }
}
