//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // Framing errors
    /// A frame header declared a payload larger than the configured ceiling.
    #[error("payload too large: {size} bytes exceeds ceiling of {max} bytes")]
    PayloadTooLarge {
        /// Declared payload length.
        size: u32,
        /// Configured ceiling.
        max: u32,
    },

    /// A buffer ended before a declared length was satisfied.
    #[error("truncated payload: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to continue decoding.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// A frame carried a tag outside the known set.
    #[error("unknown frame tag: {0:#04x}")]
    UnknownFrameTag(u8),

    // Payload errors
    /// A command payload carried a code outside the known set.
    #[error("unknown command code: {0:#04x}")]
    UnknownCommand(u8),

    /// A response payload carried a success flag other than 0x00/0x01.
    #[error("invalid success flag: {0:#04x}")]
    InvalidSuccessFlag(u8),

    /// A length-prefixed field does not fit its wire-format prefix.
    #[error("{field} too long: {len} bytes exceeds maximum of {max}")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Actual length.
        len: usize,
        /// Maximum encodable length.
        max: usize,
    },

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // Cryptographic errors
    /// Asymmetric key transport failed (generation, PEM codec or OAEP).
    #[error("key transport failed: {0}")]
    KeyTransport(String),

    /// Envelope encryption failed.
    #[error("envelope seal failed")]
    SealFailed,

    /// Envelope authentication failed. Fatal for the surrounding frame.
    #[error("envelope authentication failed")]
    OpenFailed,

    /// A key had the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength {
        /// Required key length.
        expected: usize,
        /// Provided length.
        got: usize,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_display() {
        let err = ProtocolError::PayloadTooLarge {
            size: 100_000,
            max: 65_536,
        };
        assert_eq!(
            err.to_string(),
            "payload too large: 100000 bytes exceeds ceiling of 65536 bytes"
        );
    }

    #[test]
    fn test_truncated_display() {
        let err = ProtocolError::Truncated {
            needed: 12,
            available: 4,
        };
        assert_eq!(err.to_string(), "truncated payload: need 12 bytes, have 4");
    }

    #[test]
    fn test_unknown_frame_tag_display() {
        let err = ProtocolError::UnknownFrameTag(0x7f);
        assert_eq!(err.to_string(), "unknown frame tag: 0x7f");
    }

    #[test]
    fn test_invalid_success_flag_display() {
        let err = ProtocolError::InvalidSuccessFlag(0x02);
        assert_eq!(err.to_string(), "invalid success flag: 0x02");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolError>();
    }
}
