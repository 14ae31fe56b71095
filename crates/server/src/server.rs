//! TCP listener and accept loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use protocol::ServerIdentity;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::Result;

/// Pause after a failed accept so a persistent error cannot spin the loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The CipherDrop server: a bound listener plus the shared, read-only
/// state every connection task needs.
pub struct Server {
    listener: TcpListener,
    identity: Arc<ServerIdentity>,
    root: Arc<PathBuf>,
    max_payload: u32,
}

impl Server {
    /// Bind the configured listen address and prepare the storage root.
    pub async fn bind(config: &ServerConfig, identity: ServerIdentity) -> Result<Self> {
        std::fs::create_dir_all(&config.root_dir)?;
        let listener = TcpListener::bind(&config.listen_addr).await?;

        Ok(Self {
            listener,
            identity: Arc::new(identity),
            root: Arc::new(config.root_dir.clone()),
            max_payload: config.max_payload,
        })
    }

    /// The address actually bound (resolves port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one task per connection.
    ///
    /// Accept failures are logged and retried; the `ECONNABORTED`/`EMFILE`
    /// class of transient errors must not take the listener down.
    pub async fn run(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let connection = Connection::new(
                        stream,
                        peer,
                        Arc::clone(&self.identity),
                        Arc::clone(&self.root),
                        self.max_payload,
                    );
                    tokio::spawn(connection.serve());
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }
    }
}
