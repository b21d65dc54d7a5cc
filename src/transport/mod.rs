//! Transport backends for outgoing commands
//!
//! Separates I/O concerns from command logic:
//! - **Transport**: how bytes reach the switcher (UDP, TCP, Serial)
//! - **Codec**: what the bytes are (handled separately)
//!
//! Each backend owns its own connection model:
//! - UDP: fresh socket per datagram, bound to a fixed local port, broadcast enabled
//! - TCP: fresh connection per command, closed right after the write
//! - Serial: persistent port opened once and written many times
//!
//! Sends are one-directional. Nothing is read back from the switcher, and
//! no ordering is guaranteed between sends issued independently.

pub mod serial;
pub mod tcp;
pub mod udp;

#[cfg(test)]
pub(crate) mod mock;

pub use serial::{OpenError, PortInfo, SerialHandle, SerialHost, SerialLink, SystemSerial};
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Transport selected to carry outgoing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransportKind {
    Serial,
    #[serde(rename = "TCP")]
    Tcp,
    #[default]
    #[serde(rename = "UDP")]
    Udp,
}

impl TransportKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "Serial",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }

    /// Network transports carry an ip/port pair
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(format!(
                "unknown transport '{}' (expected serial, tcp or udp)",
                other
            )),
        }
    }
}

/// A byte sink that delivers one encoded command
///
/// A transport does NOT handle:
/// - Encoding (that's the codec's job)
/// - Choosing the target (that's the connection registry's job)
/// - Retries (there are none; a failure is reported once)
pub trait Transport {
    fn kind(&self) -> TransportKind;

    /// Deliver the payload
    ///
    /// Any socket or connection opened for the call is released before
    /// returning, on success and on failure.
    fn send(&mut self, payload: Bytes) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_default_is_udp() {
        assert_eq!(TransportKind::default(), TransportKind::Udp);
    }

    #[test]
    fn test_transport_kind_parse() {
        assert_eq!("UDP".parse::<TransportKind>().unwrap(), TransportKind::Udp);
        assert_eq!("tcp".parse::<TransportKind>().unwrap(), TransportKind::Tcp);
        assert_eq!(
            "Serial".parse::<TransportKind>().unwrap(),
            TransportKind::Serial
        );
        assert!("usb".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_transport_kind_json_names() {
        assert_eq!(
            serde_json::to_string(&TransportKind::Tcp).unwrap(),
            "\"TCP\""
        );
        assert_eq!(
            serde_json::from_str::<TransportKind>("\"Serial\"").unwrap(),
            TransportKind::Serial
        );
    }

    #[test]
    fn test_network_kinds() {
        assert!(TransportKind::Udp.is_network());
        assert!(TransportKind::Tcp.is_network());
        assert!(!TransportKind::Serial.is_network());
    }
}
