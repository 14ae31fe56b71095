//! Payload codecs for command, response and chunk messages.
//!
//! All multi-byte integers are big-endian unsigned; strings are UTF-8
//! without a terminator. Every decoder validates declared lengths against
//! the bytes actually present and reports truncation instead of panicking.
//! Bytes after the last declared field form the `data` field; its length is
//! implied by the enclosing frame.

use crate::error::{ProtocolError, Result};

/// Known command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandKind {
    /// Store the attached data under the given name.
    Upload = 0x01,
    /// Retrieve a file as a chunked download.
    Download = 0x02,
    /// List the files in the session namespace.
    List = 0x03,
    /// Remove a file.
    Delete = 0x04,
}

impl CommandKind {
    /// Map a wire code into the known set.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Upload),
            0x02 => Some(Self::Download),
            0x03 => Some(Self::List),
            0x04 => Some(Self::Delete),
            _ => None,
        }
    }

    /// The wire code for this command.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A file-operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The requested operation.
    pub kind: CommandKind,
    /// Target filename. Empty for List.
    pub filename: String,
    /// Trailing data (file contents for Upload; empty otherwise).
    pub data: Vec<u8>,
}

impl Command {
    /// Create a command with no trailing data.
    pub fn new(kind: CommandKind, filename: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            data: Vec::new(),
        }
    }

    /// Create a command carrying trailing data.
    pub fn with_data(kind: CommandKind, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            data,
        }
    }

    /// Encode: code (1) + filename length (2) + filename + data.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let filename = self.filename.as_bytes();
        check_field_len("filename", filename.len(), u16::MAX as usize)?;

        let mut buf = Vec::with_capacity(3 + filename.len() + self.data.len());
        buf.push(self.kind.as_byte());
        buf.extend_from_slice(&(filename.len() as u16).to_be_bytes());
        buf.extend_from_slice(filename);
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Decode a command payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        check_len(data, 3)?;
        let kind =
            CommandKind::from_byte(data[0]).ok_or(ProtocolError::UnknownCommand(data[0]))?;

        let filename_len = read_u16(data, 1)? as usize;
        let mut offset = 3;

        check_len(data, offset + filename_len)?;
        let filename = String::from_utf8(data[offset..offset + filename_len].to_vec())?;
        offset += filename_len;

        Ok(Self {
            kind,
            filename,
            data: data[offset..].to_vec(),
        })
    }
}

/// A reply to a command or to the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Trailing data (unused by the current operations).
    pub data: Vec<u8>,
}

impl Response {
    /// Create a success response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Vec::new(),
        }
    }

    /// Create a failure response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Vec::new(),
        }
    }

    /// Encode: flag (1) + message length (2) + message + data.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let message = self.message.as_bytes();
        check_field_len("message", message.len(), u16::MAX as usize)?;

        let mut buf = Vec::with_capacity(3 + message.len() + self.data.len());
        buf.push(u8::from(self.success));
        buf.extend_from_slice(&(message.len() as u16).to_be_bytes());
        buf.extend_from_slice(message);
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Decode a response payload. Flags other than 0x00/0x01 are invalid.
    pub fn decode(data: &[u8]) -> Result<Self> {
        check_len(data, 3)?;
        let success = match data[0] {
            0x00 => false,
            0x01 => true,
            other => return Err(ProtocolError::InvalidSuccessFlag(other)),
        };

        let message_len = read_u16(data, 1)? as usize;
        let mut offset = 3;

        check_len(data, offset + message_len)?;
        let message = String::from_utf8(data[offset..offset + message_len].to_vec())?;
        offset += message_len;

        Ok(Self {
            success,
            message,
            data: data[offset..].to_vec(),
        })
    }
}

/// One segment of a chunked download, self-describing so the receiver can
/// verify the transfer without out-of-band metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Name of the file this chunk belongs to.
    pub filename: String,
    /// 0-based chunk index.
    pub index: u32,
    /// Total number of chunks in the transfer.
    pub total_chunks: u32,
    /// Length of this chunk's data in bytes.
    pub chunk_size: u32,
    /// Total file size in bytes.
    pub total_size: u64,
    /// The chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Encode: filename length (2) + filename + index (4) + total chunks (4)
    /// + chunk size (4) + total size (8) + data.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let filename = self.filename.as_bytes();
        check_field_len("filename", filename.len(), u16::MAX as usize)?;

        let mut buf = Vec::with_capacity(2 + filename.len() + 20 + self.data.len());
        buf.extend_from_slice(&(filename.len() as u16).to_be_bytes());
        buf.extend_from_slice(filename);
        buf.extend_from_slice(&self.index.to_be_bytes());
        buf.extend_from_slice(&self.total_chunks.to_be_bytes());
        buf.extend_from_slice(&self.chunk_size.to_be_bytes());
        buf.extend_from_slice(&self.total_size.to_be_bytes());
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Decode a chunk payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let filename_len = read_u16(data, 0)? as usize;
        let mut offset = 2;

        check_len(data, offset + filename_len)?;
        let filename = String::from_utf8(data[offset..offset + filename_len].to_vec())?;
        offset += filename_len;

        let index = read_u32(data, offset)?;
        offset += 4;
        let total_chunks = read_u32(data, offset)?;
        offset += 4;
        let chunk_size = read_u32(data, offset)?;
        offset += 4;
        let total_size = read_u64(data, offset)?;
        offset += 8;

        Ok(Self {
            filename,
            index,
            total_chunks,
            chunk_size,
            total_size,
            data: data[offset..].to_vec(),
        })
    }
}

#[inline]
fn check_len(data: &[u8], needed: usize) -> Result<()> {
    if data.len() < needed {
        Err(ProtocolError::Truncated {
            needed,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
fn check_field_len(field: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        Err(ProtocolError::FieldTooLong { field, len, max })
    } else {
        Ok(())
    }
}

#[inline]
fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    check_len(data, offset + 2)?;
    Ok(u16::from_be_bytes([data[offset], data[offset + 1]]))
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    check_len(data, offset + 4)?;
    Ok(u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

#[inline]
fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    check_len(data, offset + 8)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    Ok(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_wire_values() {
        assert_eq!(CommandKind::Upload.as_byte(), 0x01);
        assert_eq!(CommandKind::Download.as_byte(), 0x02);
        assert_eq!(CommandKind::List.as_byte(), 0x03);
        assert_eq!(CommandKind::Delete.as_byte(), 0x04);
        assert_eq!(CommandKind::from_byte(0x05), None);
    }

    #[test]
    fn test_command_roundtrip() {
        let original = Command::with_data(CommandKind::Upload, "hello.txt", b"hi".to_vec());
        let encoded = original.encode().unwrap();
        let decoded = Command::decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_command_empty_filename() {
        // List uses an empty filename.
        let original = Command::new(CommandKind::List, "");
        let decoded = Command::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded.kind, CommandKind::List);
        assert_eq!(decoded.filename, "");
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn test_command_wire_layout() {
        let cmd = Command::with_data(CommandKind::Download, "ab", vec![0xff]);
        let encoded = cmd.encode().unwrap();
        assert_eq!(encoded, vec![0x02, 0x00, 0x02, b'a', b'b', 0xff]);
    }

    #[test]
    fn test_command_unknown_code() {
        let result = Command::decode(&[0x09, 0x00, 0x00]);
        assert!(matches!(result, Err(ProtocolError::UnknownCommand(0x09))));
    }

    #[test]
    fn test_command_truncated_filename() {
        // Declares a 10-byte filename but supplies 2 bytes.
        let result = Command::decode(&[0x01, 0x00, 0x0a, b'a', b'b']);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn test_command_too_short() {
        let result = Command::decode(&[0x01, 0x00]);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn test_command_invalid_utf8_filename() {
        let result = Command::decode(&[0x01, 0x00, 0x02, 0xff, 0xfe]);
        assert!(matches!(result, Err(ProtocolError::InvalidUtf8(_))));
    }

    #[test]
    fn test_response_roundtrip() {
        let original = Response::ok("File uploaded successfully");
        let decoded = Response::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);

        let original = Response::failure("Invalid filename");
        let decoded = Response::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_response_empty_message() {
        // An empty listing yields an empty message.
        let original = Response::ok("");
        let decoded = Response::decode(&original.encode().unwrap()).unwrap();
        assert!(decoded.success);
        assert_eq!(decoded.message, "");
    }

    #[test]
    fn test_response_wire_layout() {
        let resp = Response::ok("ok");
        assert_eq!(resp.encode().unwrap(), vec![0x01, 0x00, 0x02, b'o', b'k']);

        let resp = Response::failure("no");
        assert_eq!(resp.encode().unwrap(), vec![0x00, 0x00, 0x02, b'n', b'o']);
    }

    #[test]
    fn test_response_invalid_flag() {
        let result = Response::decode(&[0x02, 0x00, 0x00]);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidSuccessFlag(0x02))
        ));
    }

    #[test]
    fn test_response_trailing_data() {
        let mut encoded = Response::ok("msg").encode().unwrap();
        encoded.extend_from_slice(&[1, 2, 3]);
        let decoded = Response::decode(&encoded).unwrap();
        assert_eq!(decoded.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_chunk_roundtrip() {
        let original = Chunk {
            filename: "large.bin".to_string(),
            index: 2,
            total_chunks: 3,
            chunk_size: 5,
            total_size: 300 * 1024,
            data: vec![9, 8, 7, 6, 5],
        };
        let decoded = Chunk::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_chunk_wire_layout() {
        let chunk = Chunk {
            filename: "f".to_string(),
            index: 1,
            total_chunks: 2,
            chunk_size: 3,
            total_size: 4,
            data: vec![0xaa, 0xbb, 0xcc],
        };
        let encoded = chunk.encode().unwrap();

        assert_eq!(&encoded[0..2], &[0x00, 0x01]); // filename length
        assert_eq!(encoded[2], b'f');
        assert_eq!(&encoded[3..7], &1u32.to_be_bytes());
        assert_eq!(&encoded[7..11], &2u32.to_be_bytes());
        assert_eq!(&encoded[11..15], &3u32.to_be_bytes());
        assert_eq!(&encoded[15..23], &4u64.to_be_bytes());
        assert_eq!(&encoded[23..], &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_chunk_empty_data() {
        let original = Chunk {
            filename: "empty.txt".to_string(),
            index: 0,
            total_chunks: 1,
            chunk_size: 0,
            total_size: 0,
            data: vec![],
        };
        let decoded = Chunk::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_chunk_truncated_metadata() {
        // Valid filename section, then the fixed fields cut short.
        let mut encoded = vec![0x00, 0x01, b'f'];
        encoded.extend_from_slice(&0u32.to_be_bytes());
        let result = Chunk::decode(&encoded);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn test_chunk_truncated_filename() {
        let result = Chunk::decode(&[0x00, 0x08, b'f']);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }
}
