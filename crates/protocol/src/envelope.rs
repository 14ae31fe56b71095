//! Authenticated encryption envelope for frame payloads.
//!
//! Every post-handshake payload travels sealed with AES-256-GCM under the
//! connection's session key. The wire form is `nonce || ciphertext || tag`:
//! a fresh 96-bit nonce from the OS CSPRNG, the ciphertext (same length as
//! the plaintext), and the 128-bit tag the AEAD appends.
//!
//! The envelope applies to the payload only; the frame tag and length stay
//! cleartext so reassembly works without the key. There is no associated
//! data. An `open` failure is fatal for the surrounding frame.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::crypto::SessionKey;
use crate::error::{ProtocolError, Result};

/// Nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Total envelope overhead: nonce prefix plus appended tag.
pub const ENVELOPE_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Seal a plaintext under the session key.
pub fn seal(plaintext: &[u8], key: &SessionKey) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| ProtocolError::SealFailed)?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| ProtocolError::SealFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a sealed payload under the session key.
///
/// The prepended 96 bits are the nonce. Any authentication failure, and any
/// input too short to carry a nonce and tag, yields [`ProtocolError::OpenFailed`].
pub fn open(sealed: &[u8], key: &SessionKey) -> Result<Vec<u8>> {
    if sealed.len() < ENVELOPE_OVERHEAD {
        return Err(ProtocolError::OpenFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| ProtocolError::OpenFailed)?;

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ProtocolError::OpenFailed)
}
