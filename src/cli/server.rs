//! Server command - run the HTTP API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api;
use crate::core::cipher::Backends;
use crate::core::config::Config;
use crate::core::service::SecretService;
use crate::error::Result;

/// Flags overriding the configuration file.
#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// Address to listen on [default: 127.0.0.1:8181]
    #[arg(long, env = "SECRETS_API_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Key file or key directory for the local-key backend
    #[arg(long, env = "ENC_KEY_PATH")]
    pub enc_key_path: Option<PathBuf>,

    /// Vault address, enables the vault backend
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_url: Option<String>,

    /// Vault token
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// KV path prefix for persisted secrets
    #[arg(long, env = "VAULT_STORAGE_DIR")]
    pub vault_storage_dir: Option<String>,
}

impl ServerArgs {
    /// Layer these flags over `config`.
    pub fn apply(self, config: &mut Config) {
        if let Some(addr) = self.listen_address {
            config.server.listen_address = addr;
        }
        if let Some(path) = self.enc_key_path {
            config.local_key.path = Some(path);
        }
        if let Some(url) = self.vault_url {
            config.vault.url = Some(url);
        }
        if let Some(token) = self.vault_token {
            config.vault.token = Some(token);
        }
        if let Some(dir) = self.vault_storage_dir {
            config.vault.storage_dir = Some(dir);
        }
    }
}

/// Resolve configuration from file and flags.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be loaded or the merged result
/// is invalid.
pub fn resolve_config(config_path: Option<&Path>, args: ServerArgs) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Run the server until interrupted.
pub async fn execute(config_path: Option<&Path>, args: ServerArgs) -> Result<()> {
    let config = resolve_config(config_path, args)?;

    let backends = Backends::from_config(&config).await?;
    let service = Arc::new(SecretService::new(backends));
    let app = api::build_router(service);

    let listener = TcpListener::bind(&config.server.listen_address).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
