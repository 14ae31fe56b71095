//! Frame codec for length-prefixed framing.
//!
//! # Frame Format
//!
//! Each frame consists of:
//! - 1 byte: frame tag
//! - 4 bytes: payload length (big-endian, unsigned)
//! - N bytes: payload
//!
//! The codec is tag-agnostic: it transports the raw tag byte and leaves
//! interpretation to the dispatch layer, which maps it into [`FrameType`].
//! Declared payload lengths are checked against a configurable ceiling so a
//! hostile header can never drive an allocation.

use crate::error::{ProtocolError, Result};

/// Frame header size: 1 (tag) + 4 (length) = 5 bytes.
pub const FRAME_HEADER_SIZE: usize = 5;

/// Default payload ceiling (4 GiB - 1), the largest length the wire can carry.
pub const DEFAULT_MAX_PAYLOAD: u32 = u32::MAX;

/// Known frame tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Key-transport frame, the only cleartext payload on a connection.
    Handshake = 0x01,
    /// A file operation request.
    Command = 0x02,
    /// One chunk of a chunked download.
    Data = 0x03,
    /// Reply to a command or to the handshake.
    Response = 0x04,
}

impl FrameType {
    /// Map a wire tag into the known set.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Handshake),
            0x02 => Some(Self::Command),
            0x03 => Some(Self::Data),
            0x04 => Some(Self::Response),
            _ => None,
        }
    }

    /// The wire tag for this frame type.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A frame carrying a raw tag and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw tag byte as it appeared (or will appear) on the wire.
    pub tag: u8,
    /// The payload data.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame with a known tag.
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Self {
        Self {
            tag: frame_type.as_byte(),
            payload,
        }
    }

    /// Interpret the raw tag, rejecting unknown values.
    pub fn frame_type(&self) -> Result<FrameType> {
        FrameType::from_byte(self.tag).ok_or(ProtocolError::UnknownFrameTag(self.tag))
    }
}

/// Encoder and decoder for frames.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximum accepted payload length.
    max_payload: u32,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a codec with the default payload ceiling.
    pub fn new() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Create a codec with an explicit payload ceiling.
    pub fn with_max_payload(max_payload: u32) -> Self {
        Self { max_payload }
    }

    /// The configured payload ceiling.
    pub fn max_payload(&self) -> u32 {
        self.max_payload
    }

    /// Encode a frame into bytes: tag, big-endian length, payload verbatim.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.payload.len() as u64 > self.max_payload as u64 {
            return Err(ProtocolError::PayloadTooLarge {
                size: frame.payload.len().min(u32::MAX as usize) as u32,
                max: self.max_payload,
            });
        }

        let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + frame.payload.len());
        output.push(frame.tag);
        output.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
        output.extend_from_slice(&frame.payload);
        Ok(output)
    }

    /// Decode a frame from bytes.
    ///
    /// Returns the decoded frame and the number of bytes consumed.
    pub fn decode(&self, data: &[u8]) -> Result<(Frame, usize)> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                needed: FRAME_HEADER_SIZE,
                available: data.len(),
            });
        }

        let tag = data[0];
        let payload_len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);

        if payload_len > self.max_payload {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: self.max_payload,
            });
        }

        let total = FRAME_HEADER_SIZE + payload_len as usize;
        if data.len() < total {
            return Err(ProtocolError::Truncated {
                needed: total,
                available: data.len(),
            });
        }

        let payload = data[FRAME_HEADER_SIZE..total].to_vec();
        Ok((Frame { tag, payload }, total))
    }

    /// Try to decode a frame from bytes, returning `None` if there isn't
    /// enough data yet.
    ///
    /// Oversized declared lengths are still an error: there is no amount of
    /// further input that would make the frame acceptable.
    pub fn try_decode(&self, data: &[u8]) -> Result<Option<(Frame, usize)>> {
        if data.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let payload_len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
        if payload_len > self.max_payload {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: self.max_payload,
            });
        }

        if data.len() < FRAME_HEADER_SIZE + payload_len as usize {
            return Ok(None);
        }

        self.decode(data).map(Some)
    }
}
