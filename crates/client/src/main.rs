//! CipherDrop client CLI.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use client::Client;
use protocol::TransportPublicKey;

/// CipherDrop client - secure file transfer against a CipherDrop server.
#[derive(Parser, Debug)]
#[command(name = "cipherdrop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9441", value_name = "HOST:PORT")]
    pub addr: String,

    /// Path to the server public key PEM (provisioned out-of-band)
    #[arg(short = 'k', long, value_name = "FILE")]
    pub server_key: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Commands,
}

/// Available file operations.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Upload a local file under its base name
    Upload {
        /// Local file to upload
        file: PathBuf,
    },

    /// Download a file from the server
    Download {
        /// Name of the file on the server
        name: String,

        /// Output path (defaults to the file name in the current directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List files stored in this session
    List,

    /// Delete a file on the server
    Delete {
        /// Name of the file on the server
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pem = std::fs::read_to_string(&cli.server_key).with_context(|| {
        format!(
            "failed to read server public key {}",
            cli.server_key.display()
        )
    })?;
    let server_key = TransportPublicKey::from_pem(&pem)?;

    let mut client = Client::connect(&cli.addr, &server_key)
        .await
        .with_context(|| format!("failed to connect to {}", cli.addr))?;

    match cli.command {
        Commands::Upload { file } => {
            client.upload_file(&file).await?;
            println!("Uploaded {}", file.display());
        }
        Commands::Download { name, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&name));
            let size = client.download_to_file(&name, &output).await?;
            println!("Downloaded {} ({} bytes) to {}", name, size, output.display());
        }
        Commands::List => {
            let listing = client.list().await?;
            if listing.is_empty() {
                println!("No files stored.");
            } else {
                println!("{}", listing);
            }
        }
        Commands::Delete { name } => {
            client.delete(&name).await?;
            println!("Deleted {}", name);
        }
    }

    client.shutdown().await?;
    Ok(())
}
