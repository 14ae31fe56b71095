//! # CipherDrop Protocol Library
//!
//! This crate provides the wire protocol and cryptographic primitives for
//! CipherDrop's secure file-transfer engine.
//!
//! ## Overview
//!
//! The protocol crate is the foundation shared by the server and client:
//!
//! - **Frame Codec**: 1-byte tag + 4-byte big-endian length framing with a
//!   configurable payload ceiling
//! - **Stream Reassembly**: buffering of arbitrarily fragmented reads into
//!   discrete frames
//! - **Payload Codecs**: command, response and chunk message shapes
//! - **Key Transport**: RSA-2048 OAEP/SHA-512 transport of the session key
//! - **Envelope**: AES-256-GCM authenticated encryption of every
//!   post-handshake payload
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Command / Response / Chunk payloads   │  fixed binary, big-endian
//! ├─────────────────────────────────────────┤
//! │          Envelope (post-handshake)      │  AES-256-GCM, nonce‖ct‖tag
//! ├─────────────────────────────────────────┤
//! │      Framing (tag ‖ length ‖ payload)   │  cleartext header
//! ├─────────────────────────────────────────┤
//! │              Transport (TCP)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The handshake frame is the one payload that bypasses the envelope: it
//! carries the session key sealed under the server's RSA public key instead.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{seal, open, Command, CommandKind, Frame, FrameCodec, FrameType, SessionKey};
//!
//! // Agree on a session key (normally transported via the handshake).
//! let key = SessionKey::generate();
//!
//! // Build and seal a command payload.
//! let command = Command::new(CommandKind::List, "");
//! let sealed = seal(&command.encode().unwrap(), &key).unwrap();
//!
//! // Frame it for the wire.
//! let codec = FrameCodec::new();
//! let bytes = codec.encode(&Frame::new(FrameType::Command, sealed)).unwrap();
//!
//! // The receiver reverses the layers.
//! let (frame, _) = codec.decode(&bytes).unwrap();
//! let payload = open(&frame.payload, &key).unwrap();
//! assert_eq!(Command::decode(&payload).unwrap(), command);
//! ```
//!
//! ## Modules
//!
//! - [`frame`]: frame codec and tag set
//! - [`stream`]: byte-stream reassembly
//! - [`message`]: payload codecs
//! - [`crypto`]: keypair, key transport and session keys
//! - [`envelope`]: authenticated encryption of payloads
//! - [`error`]: error types

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod message;
pub mod stream;

pub use crypto::{
    ServerIdentity, SessionKey, TransportPublicKey, RSA_KEY_BITS, SESSION_ID_LEN, SESSION_KEY_LEN,
};
pub use envelope::{open, seal, ENVELOPE_OVERHEAD, NONCE_LEN, TAG_LEN};
pub use error::{ProtocolError, Result};
pub use frame::{Frame, FrameCodec, FrameType, DEFAULT_MAX_PAYLOAD, FRAME_HEADER_SIZE};
pub use message::{Chunk, Command, CommandKind, Response};
pub use stream::{FrameBuffer, FrameProgress};
