//! # CipherDrop Server
//!
//! Session-isolated secure file storage over TCP.
//!
//! The server accepts connections on a configured address, performs an
//! RSA key-transport handshake with each client, and then executes file
//! operations (upload, download, list, delete) inside a per-session
//! directory derived from the session key. All post-handshake traffic is
//! sealed with AES-256-GCM by the `protocol` crate.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with env overrides
//! - [`keys`]: keypair loading and first-start generation
//! - [`server`]: listener and accept loop
//! - [`connection`]: per-connection state machine
//! - [`commands`]: per-session command executor
//! - [`error`]: error types

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod keys;
pub mod server;

pub use commands::{CommandExecutor, Reply};
pub use config::{ConfigError, ServerConfig};
pub use error::{Result, ServerError};
pub use keys::{load_or_generate, KeyStoreError, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
pub use server::Server;
