//! TCP transport
//!
//! No persistent session: every command opens its own connection, writes
//! the payload, shuts down the write half and drops the stream.

use super::{Transport, TransportKind};
use crate::error::{MatrixError, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// TCP transport for a single target
#[derive(Debug, Clone)]
pub struct TcpTransport {
    target: SocketAddr,
}

impl TcpTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for TcpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Tcp
    }

    async fn send(&mut self, payload: Bytes) -> Result<()> {
        let addr = self.target;
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| MatrixError::TcpConnect { addr, source })?;

        stream
            .write_all(&payload)
            .await
            .map_err(|source| MatrixError::TcpWrite { addr, source })?;

        // Close errors don't affect delivery
        let _ = stream.shutdown().await;

        debug!(target_addr = %addr, bytes = payload.len(), "TCP command sent");
        Ok(())
    }
}
