//! Error types for the client crate.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level I/O failure.
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// The server went away: clean end-of-stream or a connection-class
    /// I/O failure.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// An I/O operation timed out.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Framing, payload or cryptographic failure.
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    /// The server refused the handshake.
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    /// The server reported a command failure. The connection stays usable.
    #[error("server error: {0}")]
    Remote(String),

    /// A frame tag that was not expected at this point of the exchange.
    #[error("unexpected frame tag {tag:#04x} while waiting for {expected}")]
    UnexpectedFrame {
        /// The offending tag.
        tag: u8,
        /// What the driver was waiting for.
        expected: &'static str,
    },

    // Chunked-download integrity failures
    /// A chunk named a different file than the one requested.
    #[error("chunk filename mismatch: expected {expected:?}, got {got:?}")]
    ChunkFilenameMismatch {
        /// The requested filename.
        expected: String,
        /// The filename carried by the chunk.
        got: String,
    },

    /// A chunk arrived outside strict ascending index order.
    #[error("chunk out of order: expected index {expected}, got {got}")]
    ChunkOutOfOrder {
        /// Next expected index.
        expected: u32,
        /// Index actually received.
        got: u32,
    },

    /// A chunk's totals disagree with those captured from the first chunk.
    #[error("chunk metadata mismatch at index {index}")]
    ChunkMetadataMismatch {
        /// Index of the inconsistent chunk.
        index: u32,
    },

    /// A chunk's declared size differs from its data length.
    #[error("chunk size field {declared} does not match data length {actual}")]
    ChunkSizeMismatch {
        /// Declared `chunk_size` field.
        declared: u32,
        /// Actual data length.
        actual: usize,
    },

    /// The first chunk announced an impossible chunk count.
    #[error("invalid chunk count: {0}")]
    InvalidChunkCount(u32),

    /// The completed download does not match the announced file size.
    #[error("file size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size announced by the chunks.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => ClientError::Timeout(err.to_string()),
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => ClientError::ConnectionClosed(err.to_string()),
            _ => ClientError::Io(err),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
