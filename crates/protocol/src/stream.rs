//! Byte-stream reassembly into discrete frames.
//!
//! A TCP read can deliver half a frame, three frames, or anything in
//! between. [`FrameBuffer`] accumulates whatever arrives and hands back
//! complete frames in order. Callers feed every read into the buffer and
//! then drain it with repeated [`FrameBuffer::try_next`] calls until it
//! reports that more input is needed.

use crate::error::Result;
use crate::frame::{Frame, FrameCodec};

/// Outcome of a single [`FrameBuffer::try_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameProgress {
    /// A complete frame was extracted from the buffer.
    Ready(Frame),
    /// Fewer than five bytes are buffered; the header is incomplete.
    NeedHeader,
    /// The header is present but the declared payload has not fully arrived.
    NeedPayload,
}

/// Reassembly buffer for one connection.
///
/// Bytes are appended on ingress and drained from the front exactly when a
/// complete frame is parsed; an incomplete frame never loses bytes.
#[derive(Debug)]
pub struct FrameBuffer {
    codec: FrameCodec,
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Create a buffer using the given codec (and therefore its ceiling).
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            buffer: Vec::new(),
        }
    }

    /// Append received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Attempt to extract the next complete frame.
    ///
    /// Errors are fatal for the stream: an oversized declared length can
    /// never become a valid frame no matter how much more data arrives.
    pub fn try_next(&mut self) -> Result<FrameProgress> {
        if self.buffer.len() < crate::frame::FRAME_HEADER_SIZE {
            return Ok(FrameProgress::NeedHeader);
        }

        match self.codec.try_decode(&self.buffer)? {
            Some((frame, consumed)) => {
                self.buffer.drain(..consumed);
                Ok(FrameProgress::Ready(frame))
            }
            None => Ok(FrameProgress::NeedPayload),
        }
    }

    /// Number of buffered, not-yet-consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// True if no partial input is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
