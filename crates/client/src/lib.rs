//! # CipherDrop Client
//!
//! Client driver for the CipherDrop secure file-transfer protocol.
//!
//! A [`Client`] dials the server, transports a fresh session key under the
//! server's RSA public key (provisioned out-of-band as a PEM file), and
//! then issues file operations over the sealed channel. Downloads arrive
//! as self-describing chunks that stream straight into the caller's sink;
//! the driver re-verifies every piece of chunk metadata and refuses to
//! report success unless the final byte count matches the announced size.

pub mod error;

use std::path::Path;

use protocol::{
    open, seal, Chunk, Command, CommandKind, Frame, FrameBuffer, FrameCodec, FrameProgress,
    FrameType, Response, SessionKey, TransportPublicKey,
};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

pub use error::{ClientError, Result};

/// Read buffer size for socket reads.
const READ_BUF_SIZE: usize = 64 * 1024;

/// A connected, authenticated client.
pub struct Client {
    stream: TcpStream,
    codec: FrameCodec,
    frames: FrameBuffer,
    key: SessionKey,
    read_buf: Vec<u8>,
}

impl Client {
    /// Dial the server and perform the key-transport handshake.
    ///
    /// Generates a fresh 32-byte session key, encrypts it under the
    /// server's public key, sends it as the one cleartext handshake frame,
    /// and requires a cleartext success response before returning.
    pub async fn connect(addr: impl ToSocketAddrs, server_key: &TransportPublicKey) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let key = SessionKey::generate();
        let codec = FrameCodec::new();

        let mut client = Self {
            stream,
            frames: FrameBuffer::new(codec.clone()),
            codec,
            key,
            read_buf: vec![0u8; READ_BUF_SIZE],
        };

        let transported = server_key.encrypt_session_key(&client.key)?;
        client
            .write_frame(Frame::new(FrameType::Handshake, transported))
            .await?;

        let frame = client.read_frame().await?;
        match frame.frame_type()? {
            FrameType::Response => {
                let response = Response::decode(&frame.payload)?;
                if !response.success {
                    return Err(ClientError::HandshakeRejected(response.message));
                }
                info!(session = %client.key.session_id(), "handshake complete");
            }
            _ => {
                return Err(ClientError::UnexpectedFrame {
                    tag: frame.tag,
                    expected: "handshake response",
                })
            }
        }

        Ok(client)
    }

    /// The session id derived from this connection's key.
    pub fn session_id(&self) -> String {
        self.key.session_id()
    }

    /// Upload a file's bytes under the given name.
    pub async fn upload(&mut self, filename: &str, data: &[u8]) -> Result<()> {
        debug!(filename, size = data.len(), "uploading");
        let command = Command::with_data(CommandKind::Upload, filename, data.to_vec());
        let response = self.request(command).await?;
        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        info!(filename, "file uploaded");
        Ok(())
    }

    /// Upload a local file under its base name.
    pub async fn upload_file(&mut self, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.upload(&filename, &data).await
    }

    /// Download a file, streaming chunk data into `sink` in arrival order.
    ///
    /// Returns the number of bytes written. Chunks never accumulate in
    /// memory beyond the one being handled.
    pub async fn download<W>(&mut self, filename: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        debug!(filename, "requesting download");
        let command = Command::new(CommandKind::Download, filename);
        let response = self.request(command).await?;
        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        debug!(filename, message = %response.message, "download accepted");

        let mut received: u32 = 0;
        let mut written: u64 = 0;
        // Captured from chunk 0 and enforced on every later chunk.
        let mut announced: Option<(u32, u64)> = None;

        loop {
            let frame = self.read_sealed().await?;
            if frame.frame_type()? != FrameType::Data {
                return Err(ClientError::UnexpectedFrame {
                    tag: frame.tag,
                    expected: "chunk data",
                });
            }

            let chunk = Chunk::decode(&frame.payload)?;
            let (total_chunks, _) = self.verify_chunk(&chunk, filename, received, &mut announced)?;

            sink.write_all(&chunk.data).await?;
            written += chunk.data.len() as u64;
            received += 1;

            if received == total_chunks {
                break;
            }
        }

        sink.flush().await?;

        let (_, total_size) = announced.unwrap_or((0, 0));
        if written != total_size {
            return Err(ClientError::SizeMismatch {
                expected: total_size,
                actual: written,
            });
        }

        info!(filename, size = written, chunks = received, "file downloaded");
        Ok(written)
    }

    /// Download a file to a path on disk.
    pub async fn download_to_file(&mut self, filename: &str, output: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(output).await?;
        let written = self.download(filename, &mut file).await?;
        file.sync_all().await?;
        Ok(written)
    }

    /// List the session's files. The result is the server's
    /// newline-separated listing; empty for an empty session.
    pub async fn list(&mut self) -> Result<String> {
        let response = self.request(Command::new(CommandKind::List, "")).await?;
        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        Ok(response.message)
    }

    /// Delete a file.
    pub async fn delete(&mut self, filename: &str) -> Result<()> {
        let response = self
            .request(Command::new(CommandKind::Delete, filename))
            .await?;
        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        info!(filename, "file deleted");
        Ok(())
    }

    /// Close the connection.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Check one chunk's self-described metadata against the request and
    /// against the totals announced by chunk 0.
    fn verify_chunk(
        &self,
        chunk: &Chunk,
        filename: &str,
        expected_index: u32,
        announced: &mut Option<(u32, u64)>,
    ) -> Result<(u32, u64)> {
        if chunk.filename != filename {
            return Err(ClientError::ChunkFilenameMismatch {
                expected: filename.to_string(),
                got: chunk.filename.clone(),
            });
        }
        if chunk.index != expected_index {
            return Err(ClientError::ChunkOutOfOrder {
                expected: expected_index,
                got: chunk.index,
            });
        }
        if chunk.chunk_size as usize != chunk.data.len() {
            return Err(ClientError::ChunkSizeMismatch {
                declared: chunk.chunk_size,
                actual: chunk.data.len(),
            });
        }

        match *announced {
            None => {
                if chunk.total_chunks == 0 {
                    return Err(ClientError::InvalidChunkCount(0));
                }
                debug!(
                    filename,
                    total_chunks = chunk.total_chunks,
                    total_size = chunk.total_size,
                    "receiving chunks"
                );
                *announced = Some((chunk.total_chunks, chunk.total_size));
                Ok((chunk.total_chunks, chunk.total_size))
            }
            Some((total_chunks, total_size)) => {
                if chunk.total_chunks != total_chunks || chunk.total_size != total_size {
                    return Err(ClientError::ChunkMetadataMismatch { index: chunk.index });
                }
                Ok((total_chunks, total_size))
            }
        }
    }

    /// Send a sealed command and wait for the sealed response.
    async fn request(&mut self, command: Command) -> Result<Response> {
        self.send_sealed(FrameType::Command, &command.encode()?)
            .await?;

        let frame = self.read_sealed().await?;
        match frame.frame_type()? {
            FrameType::Response => Ok(Response::decode(&frame.payload)?),
            _ => Err(ClientError::UnexpectedFrame {
                tag: frame.tag,
                expected: "command response",
            }),
        }
    }

    /// Seal a payload and write it as a frame.
    async fn send_sealed(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<()> {
        let sealed = seal(payload, &self.key)?;
        self.write_frame(Frame::new(frame_type, sealed)).await
    }

    /// Read the next frame and open its sealed payload in place.
    async fn read_sealed(&mut self) -> Result<Frame> {
        let mut frame = self.read_frame().await?;
        frame.payload = open(&frame.payload, &self.key)?;
        Ok(frame)
    }

    async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let bytes = self.codec.encode(&frame)?;
        self.stream.write_all(&bytes).await?;
        Ok(())
    }

    /// Read socket data until the reassembly buffer yields a frame.
    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let FrameProgress::Ready(frame) = self.frames.try_next()? {
                return Ok(frame);
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed("end of stream".to_string()));
            }
            self.frames.feed(&self.read_buf[..n]);
        }
    }
}
