//! secrets-api - secrets encryption service.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use secrets_api::cli::output;
use secrets_api::cli::{execute, Cli};
use secrets_api::core::constants::LOG_ENV;
use secrets_api::error::{ConfigError, Error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("secrets_api=debug,tower_http=debug")
        } else {
            EnvFilter::new("secrets_api=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    if let Err(e) = execute(cli).await {
        let suggestion = match &e {
            Error::Config(ConfigError::KeyFileExists(_)) => Some("pass --force to overwrite"),
            Error::Config(ConfigError::InvalidKeyFile { .. }) => {
                Some("generate one with: secrets-api keygen <path>")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
