//! CipherDrop Server
//!
//! Binary entrypoint: configuration, logging, keypair bootstrap and the
//! accept loop, with signal-driven shutdown.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use server::{load_or_generate, Server, ServerConfig};
use tokio::signal::unix::{signal, SignalKind};

/// CipherDrop server - session-isolated secure file storage over TCP.
#[derive(Parser, Debug)]
#[command(name = "cipherdrop-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(long, value_name = "HOST:PORT")]
    pub listen: Option<String>,

    /// Storage root directory (overrides config)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Key directory holding private.pem/public.pem (overrides config)
    #[arg(long, value_name = "DIR")]
    pub keys: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(root) = cli.root {
        config.root_dir = root;
    }
    if let Some(keys) = cli.keys {
        config.key_dir = keys;
    }

    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    tracing::info!("CipherDrop server starting...");
    let identity = load_or_generate(&config.key_dir)?;
    let server = Server::bind(&config, identity).await?;

    // The accept loop runs until a termination signal wins the race.
    let mut term = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut int = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    tokio::select! {
        result = server.run() => result?,
        _ = term.recv() => tracing::info!("SIGTERM received, shutting down"),
        _ = int.recv() => tracing::info!("interrupt received, shutting down"),
    }

    Ok(())
}
