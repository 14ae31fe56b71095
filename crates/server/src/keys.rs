//! Keypair persistence for the server.
//!
//! The server identity lives as `private.pem` (PKCS#8) and `public.pem`
//! (SPKI) in the configured key directory. On first start the directory is
//! created and a fresh RSA-2048 keypair is generated and written out; the
//! public PEM is what operators hand to clients out-of-band.

use std::fs;
use std::io::Write;
use std::path::Path;

use protocol::ServerIdentity;
use thiserror::Error;
use tracing::info;

/// File name of the PKCS#8 private key PEM.
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// File name of the SPKI public key PEM.
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// Errors from keypair loading or generation.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),
}

/// Load the identity from `key_dir`, generating and persisting a new one
/// if no private key exists yet.
pub fn load_or_generate(key_dir: &Path) -> Result<ServerIdentity, KeyStoreError> {
    let private_path = key_dir.join(PRIVATE_KEY_FILE);

    if private_path.exists() {
        let pem = fs::read_to_string(&private_path)?;
        let identity = ServerIdentity::from_private_key_pem(&pem)?;
        info!(path = %private_path.display(), "loaded server keypair");
        return Ok(identity);
    }

    info!(dir = %key_dir.display(), "no keypair found, generating RSA-2048 keypair");
    let identity = ServerIdentity::generate()?;

    fs::create_dir_all(key_dir)?;
    write_private(&private_path, &identity.private_key_pem()?)?;
    fs::write(key_dir.join(PUBLIC_KEY_FILE), identity.public_key_pem()?)?;
    info!(dir = %key_dir.display(), "wrote private.pem and public.pem");

    Ok(identity)
}

/// Write the private PEM with owner-only permissions.
fn write_private(path: &Path, pem: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(pem.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{SessionKey, TransportPublicKey};
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_both_pems() {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");

        let _identity = load_or_generate(&key_dir).unwrap();

        assert!(key_dir.join(PRIVATE_KEY_FILE).exists());
        assert!(key_dir.join(PUBLIC_KEY_FILE).exists());
    }

    #[test]
    fn test_second_load_reuses_keypair() {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");

        let first = load_or_generate(&key_dir).unwrap();
        let second = load_or_generate(&key_dir).unwrap();

        // The reloaded identity must decrypt what the first one's public
        // half encrypts.
        let key = SessionKey::generate();
        let ciphertext = first.public_key().encrypt_session_key(&key).unwrap();
        let recovered = second.decrypt_session_key(&ciphertext).unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn test_written_public_pem_is_usable() {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");

        let identity = load_or_generate(&key_dir).unwrap();
        let pem = fs::read_to_string(key_dir.join(PUBLIC_KEY_FILE)).unwrap();
        let public = TransportPublicKey::from_pem(&pem).unwrap();

        let key = SessionKey::generate();
        let ciphertext = public.encrypt_session_key(&key).unwrap();
        assert_eq!(identity.decrypt_session_key(&ciphertext).unwrap(), key);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_pem_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");
        load_or_generate(&key_dir).unwrap();

        let mode = fs::metadata(key_dir.join(PRIVATE_KEY_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_private_pem_fails() {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");
        fs::create_dir_all(&key_dir).unwrap();
        fs::write(key_dir.join(PRIVATE_KEY_FILE), "garbage").unwrap();

        let result = load_or_generate(&key_dir);
        assert!(matches!(result, Err(KeyStoreError::Protocol(_))));
    }
}
