//! Configuration management for the CipherDrop server.
//!
//! This module provides TOML-based configuration file loading with
//! environment-variable overrides. All fields have workable defaults so a
//! bare `cipherdrop-server` starts out of the box.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("listen_addr is not a valid socket address: {0}")]
    InvalidListenAddr(String),

    #[error("max_payload must be at least 1024 bytes, got {0}")]
    InvalidMaxPayload(u32),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the CipherDrop server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the TCP listener binds, e.g. `127.0.0.1:9441`.
    pub listen_addr: String,

    /// Root directory under which per-session storage lives.
    pub root_dir: PathBuf,

    /// Directory holding `private.pem`/`public.pem`; the keypair is
    /// generated there on first start.
    pub key_dir: PathBuf,

    /// Ceiling on accepted frame payload lengths in bytes.
    pub max_payload: u32,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9441".to_string(),
            root_dir: PathBuf::from("storage"),
            key_dir: PathBuf::from("keys"),
            max_payload: protocol::DEFAULT_MAX_PAYLOAD,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - `CIPHERDROP_LISTEN_ADDR`: override the listen address
    /// - `CIPHERDROP_ROOT_DIR`: override the storage root
    /// - `CIPHERDROP_LOG_LEVEL`: override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("CIPHERDROP_LISTEN_ADDR") {
            if !addr.is_empty() {
                tracing::info!("Overriding listen_addr from environment: {}", addr);
                self.listen_addr = addr;
            }
        }
        if let Ok(root) = std::env::var("CIPHERDROP_ROOT_DIR") {
            if !root.is_empty() {
                tracing::info!("Overriding root_dir from environment: {}", root);
                self.root_dir = PathBuf::from(root);
            }
        }
        if let Ok(level) = std::env::var("CIPHERDROP_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }

        // Anything smaller cannot even carry a sealed handshake reply.
        if self.max_payload < 1024 {
            return Err(ConfigError::InvalidMaxPayload(self.max_payload));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:9441");
        assert_eq!(config.root_dir, PathBuf::from("storage"));
        assert_eq!(config.max_payload, protocol::DEFAULT_MAX_PAYLOAD);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
listen_addr = "0.0.0.0:7000"
root_dir = "/var/lib/cipherdrop"
key_dir = "/etc/cipherdrop/keys"
max_payload = 1048576
log_level = "debug"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:7000");
        assert_eq!(config.root_dir, PathBuf::from("/var/lib/cipherdrop"));
        assert_eq!(config.key_dir, PathBuf::from("/etc/cipherdrop/keys"));
        assert_eq!(config.max_payload, 1_048_576);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listen_addr = \"127.0.0.1:8888\"\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8888");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ServerConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listen_addr = [not toml").unwrap();

        assert!(ServerConfig::load(&path).is_err());
    }

    #[test]
    fn test_validate_bad_listen_addr() {
        let config = ServerConfig {
            listen_addr: "not-an-address".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidListenAddr("not-an-address".to_string()))
        );
    }

    #[test]
    fn test_validate_bad_max_payload() {
        let config = ServerConfig {
            max_payload: 100,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxPayload(100)));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let config = ServerConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("chatty".to_string()))
        );
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let config = ServerConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let restored: ServerConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(config, restored);
    }
}
