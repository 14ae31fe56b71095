//! Per-connection protocol state machine.
//!
//! Each accepted socket is owned by exactly one task running
//! [`Connection::serve`]. The task reads from the socket, feeds the
//! reassembly buffer, and drains complete frames through the phase machine:
//!
//! - `New`: only a Handshake frame is acceptable. Its payload is the
//!   session key under RSA-OAEP; a cleartext success response acknowledges
//!   it and the connection becomes `Authenticated`.
//! - `Authenticated`: only sealed Command frames are acceptable. Replies
//!   (including every chunk of a download) are sealed under the session
//!   key and written in order.
//!
//! Any framing, crypto or protocol violation ends the task; the session
//! key and buffer are released with it. Application-level failures never
//! reach this layer — the executor converts them to failure responses.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use protocol::{
    open, seal, Command, Frame, FrameBuffer, FrameCodec, FrameProgress, FrameType, Response,
    ServerIdentity, SessionKey,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::commands::CommandExecutor;
use crate::error::{Result, ServerError};

/// Read buffer size for socket reads.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Connection lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepted, no handshake yet.
    New,
    /// Session key established; commands are accepted.
    Authenticated,
    /// Terminal state.
    Closed,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Authenticated => "authenticated",
            Phase::Closed => "closed",
        }
    }
}

/// State for one authenticated session.
struct Session {
    key: SessionKey,
    executor: CommandExecutor,
}

/// Handler owning one accepted connection.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    identity: Arc<ServerIdentity>,
    root: Arc<PathBuf>,
    codec: FrameCodec,
    frames: FrameBuffer,
    phase: Phase,
    session: Option<Session>,
}

impl Connection {
    /// Wrap an accepted socket.
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        identity: Arc<ServerIdentity>,
        root: Arc<PathBuf>,
        max_payload: u32,
    ) -> Self {
        let codec = FrameCodec::with_max_payload(max_payload);
        Self {
            stream,
            peer,
            identity,
            root,
            frames: FrameBuffer::new(codec.clone()),
            codec,
            phase: Phase::New,
            session: None,
        }
    }

    /// Drive the connection until it closes, logging the outcome.
    ///
    /// This is the task entrypoint; it never propagates errors because
    /// there is nobody above it to handle them.
    pub async fn serve(mut self) {
        match self.run().await {
            Ok(()) => debug!(peer = %self.peer, "connection closed"),
            Err(e) => warn!(peer = %self.peer, error = %e, "connection terminated"),
        }
        self.phase = Phase::Closed;
    }

    async fn run(&mut self) -> Result<()> {
        let mut read_buf = vec![0u8; READ_BUF_SIZE];

        loop {
            let n = self.stream.read(&mut read_buf).await?;
            if n == 0 {
                // EOF mid-frame is a framing error, not a clean close.
                if !self.frames.is_empty() {
                    return Err(ServerError::TruncatedStream(self.frames.buffered()));
                }
                return Ok(());
            }

            self.frames.feed(&read_buf[..n]);

            // One read can carry several frames, or a fraction of one.
            loop {
                match self.frames.try_next()? {
                    FrameProgress::Ready(frame) => self.handle_frame(frame).await?,
                    FrameProgress::NeedHeader | FrameProgress::NeedPayload => break,
                }
            }
        }
    }

    async fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        let frame_type = frame.frame_type()?;

        match (self.phase, frame_type) {
            (Phase::New, FrameType::Handshake) => self.complete_handshake(&frame.payload).await,
            (Phase::Authenticated, FrameType::Command) => {
                self.handle_command(&frame.payload).await
            }
            (phase, _) => Err(ServerError::UnexpectedFrame {
                tag: frame.tag,
                phase: phase.name(),
            }),
        }
    }

    /// Recover the session key from the handshake payload and acknowledge
    /// with the one cleartext response this connection will ever send.
    async fn complete_handshake(&mut self, payload: &[u8]) -> Result<()> {
        let key = self.identity.decrypt_session_key(payload)?;
        let executor = CommandExecutor::new(&self.root, &key);

        info!(
            peer = %self.peer,
            session = %executor.session_id(),
            "handshake complete"
        );

        let response = Response::ok("handshake complete").encode()?;
        self.write_frame(Frame::new(FrameType::Response, response))
            .await?;

        self.session = Some(Session { key, executor });
        self.phase = Phase::Authenticated;
        Ok(())
    }

    /// Open a sealed command, execute it, and seal every reply in order.
    async fn handle_command(&mut self, payload: &[u8]) -> Result<()> {
        let (key, replies) = {
            let session = self.session.as_ref().ok_or(ServerError::NoSession)?;
            let plaintext = open(payload, &session.key)?;
            let command = Command::decode(&plaintext)?;
            (session.key.clone(), session.executor.execute(&command))
        };

        for reply in replies {
            let sealed = seal(&reply.encode_payload()?, &key)?;
            self.write_frame(Frame::new(reply.frame_type(), sealed))
                .await?;
        }
        Ok(())
    }

    async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let bytes = self.codec.encode(&frame)?;
        self.stream.write_all(&bytes).await?;
        Ok(())
    }
}
