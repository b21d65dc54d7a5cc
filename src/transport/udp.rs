//! UDP transport
//!
//! One datagram per command. The socket is bound to a fixed local port with
//! SO_REUSEADDR and SO_BROADCAST set, used for a single `send_to`, then
//! dropped whatever the outcome.

use super::{Transport, TransportKind};
use crate::error::{MatrixError, Result};
use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// UDP transport for a single target
///
/// # Example
///
/// ```ignore
/// let mut transport = UdpTransport::new("192.168.1.200:6789".parse()?, 5000);
/// transport.send(Bytes::from_static(b"OSDON")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UdpTransport {
    target: SocketAddr,
    local_port: u16,
}

impl UdpTransport {
    /// Create a transport sending to `target` from `local_port`
    ///
    /// A `local_port` of 0 lets the OS pick an ephemeral port.
    pub fn new(target: SocketAddr, local_port: u16) -> Self {
        Self { target, local_port }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for UdpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Udp
    }

    async fn send(&mut self, payload: Bytes) -> Result<()> {
        let socket = bind_broadcast_socket(self.local_port)?;

        let sent = socket
            .send_to(&payload, self.target)
            .await
            .map_err(|source| MatrixError::UdpSend {
                addr: self.target,
                source,
            })?;

        debug!(target_addr = %self.target, bytes = sent, "UDP datagram sent");
        Ok(())
    }
}

/// Create a UDP socket on `0.0.0.0:port` with broadcast enabled
///
/// SO_REUSEADDR lets back-to-back sends rebind the fixed port immediately.
fn bind_broadcast_socket(port: u16) -> Result<UdpSocket> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let map_err = |source| MatrixError::UdpBind { port, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(map_err)?;
    socket.set_reuse_address(true).map_err(map_err)?;
    socket.set_broadcast(true).map_err(map_err)?;
    socket.set_nonblocking(true).map_err(map_err)?;
    socket.bind(&addr.into()).map_err(map_err)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(map_err)
}
