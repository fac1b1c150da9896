//! Test fixtures: keys and preconfigured services.

use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey};
use sha2::Sha256;

use secrets_api::core::cipher::{aes, Backend, Backends, KeyRing, LocalKey, Vault};
use secrets_api::core::domain::{BackendKind, BulkSecret, Payload, Secret};
use secrets_api::core::service::SecretService;
use secrets_api::core::store::MemoryVault;

/// Key names available on the local-key backend.
pub const LOCAL_KEYS: &[&str] = &["alpha", "beta"];

/// Secrets used across bulk tests, in request order.
pub const BULK_PLAINTEXTS: &[&str] = &["first", "second", "third", "fourth"];

/// One RSA key pair shared by every test in the binary.
pub fn rsa_private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("rsa keygen"))
}

/// SPKI PEM of the shared public key.
pub fn rewrap_pem() -> String {
    rsa_private_key()
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("encode pem")
}

/// Decrypt a `rewrapText` with the shared private key.
pub fn rsa_decrypt(rewrap_text: &str) -> Vec<u8> {
    let ciphertext = STANDARD.decode(rewrap_text).expect("rewrapText is base64");
    rsa_private_key()
        .decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .expect("rsa decrypt")
}

/// A local-key backend holding fresh keys for [`LOCAL_KEYS`].
pub fn local_key_backend() -> Backend {
    let keys = KeyRing::from_keys(
        LOCAL_KEYS
            .iter()
            .map(|name| (name.to_string(), aes::generate_key(&mut OsRng))),
    );
    Backend::LocalKey(LocalKey::new(keys))
}

/// A service running every backend, with vault on an in-memory store.
pub fn service(storage_dir: Option<&str>) -> (SecretService, Arc<MemoryVault>) {
    let store = Arc::new(MemoryVault::new());
    (service_on(store.clone(), storage_dir), store)
}

/// A service whose vault backend uses `store` under `storage_dir`.
pub fn service_on(store: Arc<MemoryVault>, storage_dir: Option<&str>) -> SecretService {
    let backends = Backends::new()
        .with(local_key_backend())
        .with(Backend::Vault(Vault::new(store.clone(), store, storage_dir)));
    SecretService::new(backends)
}

/// A create request.
pub fn new_secret(kind: BackendKind, key_name: &str, clear_text: &str) -> Secret {
    let mut secret = Secret::new(kind, key_name, clear_text);
    secret.name = format!("{}-{}", kind, clear_text.len());
    secret
}

/// Turn a created secret into a rewrap request for the shared key.
pub fn rewrap_request(mut created: Secret) -> Secret {
    created.rewrap_key = rewrap_pem();
    created
}

/// Bulk create payload over [`BULK_PLAINTEXTS`].
pub fn bulk_create(kind: BackendKind, key_name: &str) -> Payload {
    Payload::Bulk(BulkSecret::new(
        BULK_PLAINTEXTS
            .iter()
            .map(|text| new_secret(kind, key_name, text))
            .collect(),
    ))
}

/// Create one secret and return the stored record.
pub async fn create_one(service: &SecretService, secret: Secret) -> Secret {
    service
        .create(Payload::Single(secret))
        .await
        .expect("create")
        .into_single()
        .expect("single response")
}
