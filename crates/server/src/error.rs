//! Error types for the server crate.

use thiserror::Error;

/// Server error type.
///
/// Everything here closes the connection it occurs on; command-level
/// failures never surface as a `ServerError` — they become failure
/// responses and the connection stays open.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Transport-level I/O failure.
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// The peer went away mid-conversation.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// An I/O operation timed out.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Framing, payload or cryptographic failure.
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    /// The peer closed the stream in the middle of a frame.
    #[error("stream ended mid-frame with {0} buffered bytes")]
    TruncatedStream(usize),

    /// A frame tag that is not valid in the connection's current phase.
    #[error("unexpected frame tag {tag:#04x} in {phase} phase")]
    UnexpectedFrame {
        /// The offending tag.
        tag: u8,
        /// Phase the connection was in.
        phase: &'static str,
    },

    /// A command arrived without an established session.
    #[error("no session established")]
    NoSession,
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => ServerError::Timeout(err.to_string()),
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => ServerError::ConnectionClosed(err.to_string()),
            _ => ServerError::Io(err),
        }
    }
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_stream_display() {
        let err = ServerError::TruncatedStream(9);
        assert_eq!(err.to_string(), "stream ended mid-frame with 9 buffered bytes");
    }

    #[test]
    fn test_unexpected_frame_display() {
        let err = ServerError::UnexpectedFrame {
            tag: 0x03,
            phase: "new",
        };
        assert_eq!(err.to_string(), "unexpected frame tag 0x03 in new phase");
    }

    #[test]
    fn test_protocol_error_transparent() {
        let err: ServerError = protocol::ProtocolError::OpenFailed.into();
        assert_eq!(err.to_string(), "envelope authentication failed");
    }

    #[test]
    fn test_from_io_error_connection_closed() {
        for kind in [
            std::io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::UnexpectedEof,
        ] {
            let err: ServerError = std::io::Error::new(kind, "gone").into();
            assert!(matches!(err, ServerError::ConnectionClosed(_)), "{:?}", kind);
        }
    }

    #[test]
    fn test_from_io_error_timeout() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: ServerError = io_err.into();
        assert!(matches!(err, ServerError::Timeout(_)));
    }

    #[test]
    fn test_from_io_error_other() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ServerError = io_err.into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
