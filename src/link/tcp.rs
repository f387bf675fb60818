//! # TCP Transport
//!
//! Concrete [`Transport`] over a TCP bridge to the vehicle.
//!
//! The vehicle's receiver exposes a BLE UART characteristic; in bench and
//! bridge setups the same byte stream is reachable as `host:port`. The
//! command protocol is transport-agnostic, so this is the crate's bundled
//! production transport: one connection, commands written as lines.
//!
//! The newline terminator is appended here; the terminator convention
//! belongs to the transport layer, not to the command encoder.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::transport::{Transport, WriteChannel};

/// Line terminator appended to every command.
pub const COMMAND_TERMINATOR: &[u8] = b"\n";

/// TCP bridge connector.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl TcpTransport {
    /// Creates the connector. Stateless; connections carry all state.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, address: &str) -> io::Result<Arc<dyn WriteChannel>> {
        debug!("opening TCP link to {}", address);
        let stream = TcpStream::connect(address).await?;
        // Control traffic is tiny and latency-sensitive
        stream.set_nodelay(true)?;

        let (_read_half, write_half) = stream.into_split();
        info!("TCP link to {} established", address);

        Ok(Arc::new(TcpChannel {
            writer: Mutex::new(write_half),
            peer: address.to_string(),
        }))
    }
}

/// Write half of one established TCP link.
pub struct TcpChannel {
    writer: Mutex<OwnedWriteHalf>,
    peer: String,
}

impl std::fmt::Debug for TcpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpChannel")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl TcpChannel {
    /// Address of the remote end.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl WriteChannel for TcpChannel {
    async fn write(&self, payload: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload).await?;
        writer.write_all(COMMAND_TERMINATOR).await?;
        writer.flush().await
    }

    async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!("TCP link to {} shutdown error: {}", self.peer, e);
        }
    }
}
