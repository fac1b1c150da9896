//! Vault over HTTP.
//!
//! Speaks the subset of the Vault API the service needs: transit
//! encrypt/decrypt, generic KV read/write/delete, and token self-lookup and
//! renewal. Every request carries the per-request timeout from
//! configuration; connection failures, timeouts and 5xx responses are
//! reported as `StorageError::Unavailable` so callers can retry later.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{KvStore, Transit};
use crate::core::config::VaultConfig;
use crate::core::constants::KV_CIPHERTEXT_FIELD;
use crate::error::{BackendError, ConfigError, Result, StorageError};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Vault API client.
///
/// Cheap to share behind an `Arc`; the underlying connection pool is reused
/// across requests.
pub struct VaultClient {
    http: Client,
    addr: String,
    token: Zeroizing<String>,
    namespace: Option<String>,
    transit_mount: String,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("addr", &self.addr)
            .field("namespace", &self.namespace)
            .field("transit_mount", &self.transit_mount)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct EncryptData {
    ciphertext: String,
}

#[derive(Deserialize)]
struct DecryptData {
    plaintext: String,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct TokenLookup {
    #[serde(default)]
    meta: Option<TokenMeta>,
}

#[derive(Deserialize)]
struct TokenMeta {
    #[serde(default)]
    storage_dir: Option<String>,
}

impl VaultClient {
    /// Build a client from the `[vault]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the URL or token is missing, or
    /// if the HTTP client cannot be constructed.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let addr = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::InvalidValue {
                field: "vault.url",
                reason: "required when the vault backend is enabled".to_string(),
            })?;
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::InvalidValue {
                field: "vault.token",
                reason: "required when the vault backend is enabled".to_string(),
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "vault",
                reason: format!("cannot build http client: {}", e),
            })?;

        Ok(Self {
            http,
            addr: addr.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token.to_string()),
            namespace: config.namespace.clone().filter(|n| !n.is_empty()),
            transit_mount: config.transit_mount.trim_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/{}", self.addr, path.trim_start_matches('/'));
        let builder = self
            .http
            .request(method, url)
            .header(TOKEN_HEADER, self.token.as_str());
        match &self.namespace {
            Some(ns) => builder.header(NAMESPACE_HEADER, ns),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        builder.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                "connection failed".to_string()
            } else {
                format!("request failed: {}", e)
            };
            StorageError::Unavailable(reason).into()
        })
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()).into())
    }

    /// Collapse a non-success response into a message for logs and errors.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        if body.errors.is_empty() {
            format!("vault returned {}", status)
        } else {
            format!("vault returned {}: {}", status, body.errors.join("; "))
        }
    }

    /// Classify a failed transit response.
    async fn transit_error(response: reqwest::Response) -> crate::error::Error {
        let status = response.status();
        let message = Self::error_message(response).await;
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            StorageError::Unavailable(message).into()
        } else {
            BackendError::Rejected(message).into()
        }
    }

    /// Storage namespace advertised in the token's metadata, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the lookup cannot be completed.
    pub async fn lookup_storage_dir(&self) -> Result<Option<String>> {
        let response = self
            .send(self.request(Method::GET, "auth/token/lookup-self"))
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::Unavailable(Self::error_message(response).await).into());
        }

        let lookup: Envelope<TokenLookup> = Self::json(response).await?;
        let dir = lookup
            .data
            .meta
            .and_then(|m| m.storage_dir)
            .filter(|d| !d.is_empty());
        debug!(storage_dir = ?dir, "looked up token storage namespace");
        Ok(dir)
    }

    /// Extend the lease on the client token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if Vault refuses or cannot be
    /// reached.
    pub async fn renew_token(&self) -> Result<()> {
        let response = self
            .send(self.request(Method::POST, "auth/token/renew-self").json(&json!({})))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(Self::error_message(response).await).into())
        }
    }
}

#[async_trait]
impl Transit for VaultClient {
    async fn encrypt(&self, key_name: &str, plaintext: &[u8]) -> Result<String> {
        let path = format!("{}/encrypt/{}", self.transit_mount, key_name);
        let encoded = Zeroizing::new(STANDARD.encode(plaintext));
        let response = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "plaintext": encoded.as_str() })),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::transit_error(response).await);
        }
        let body: Envelope<EncryptData> = Self::json(response).await?;
        Ok(body.data.ciphertext)
    }

    async fn decrypt(&self, key_name: &str, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>> {
        let path = format!("{}/decrypt/{}", self.transit_mount, key_name);
        let response = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "ciphertext": ciphertext })),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::transit_error(response).await);
        }
        let body: Envelope<DecryptData> = Self::json(response).await?;
        let encoded = Zeroizing::new(body.data.plaintext);
        STANDARD
            .decode(encoded.as_str())
            .map(Zeroizing::new)
            .map_err(|_| BackendError::MalformedResponse("plaintext is not base64".into()).into())
    }
}

#[async_trait]
impl KvStore for VaultClient {
    async fn write(&self, path: &str, cipher_text: &str) -> Result<()> {
        let response = self
            .send(
                self.request(Method::POST, path)
                    .json(&json!({ KV_CIPHERTEXT_FIELD: cipher_text })),
            )
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(Self::error_message(response).await).into())
        }
    }

    async fn read(&self, path: &str) -> Result<String> {
        let response = self.send(self.request(Method::GET, path)).await?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(path.to_string()).into()),
            _ => {
                return Err(StorageError::Unavailable(Self::error_message(response).await).into())
            }
        }

        let body: Envelope<Value> = Self::json(response).await?;
        body.data
            .get(KV_CIPHERTEXT_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BackendError::MalformedResponse(format!(
                    "stored record has no {} field",
                    KV_CIPHERTEXT_FIELD
                ))
                .into()
            })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(self.request(Method::DELETE, path)).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StorageError::Unavailable(Self::error_message(response).await).into())
        }
    }
}

/// Renew the client token every `interval` until the runtime shuts down.
///
/// Failures are logged and retried on the next tick.
pub fn spawn_token_renewal(client: Arc<VaultClient>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "starting vault token renewal");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the token is fresh at startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match client.renew_token().await {
                Ok(()) => debug!("renewed vault token"),
                Err(e) => warn!(error = %e, "vault token renewal failed"),
            }
        }
    })
}
