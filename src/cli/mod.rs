//! Command-line interface.

pub mod keygen;
pub mod output;
pub mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

/// secrets-api - encrypt, rewrap and purge secrets over HTTP.
#[derive(Parser)]
#[command(
    name = "secrets-api",
    about = "Secrets encryption service with pluggable backends and public-key rewrap",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "SECRETS_API_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Server(server::ServerArgs),

    /// Generate a local AES-256 key file
    Keygen {
        /// Where to write the key
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns error if configuration is invalid or the command fails.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Server(args) => server::execute(cli.config.as_deref(), args).await,
        Command::Keygen { path, force } => keygen::execute(&path, force),
    }
}
