//! Connection registry
//!
//! Holds the active transport and the per-transport parameters. UDP and TCP
//! each keep their own address, so switching the active transport never
//! loses the other one's settings: the active address is always read from
//! the active transport's own fields.

use crate::constants::{DEFAULT_DEVICE_PORT, DEFAULT_TCP_IP, DEFAULT_UDP_IP};
use crate::error::{MatrixError, Result};
use crate::transport::TransportKind;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Transport selection and addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    #[serde(alias = "type")]
    pub active_type: TransportKind,
    pub udp_ip: String,
    pub udp_port: u16,
    pub tcp_ip: String,
    pub tcp_port: u16,
    /// Identifier of the selected serial port (empty = none)
    pub serial_port: String,
    /// Cached flag, reconciled against the live link on load
    pub serial_connected: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            active_type: TransportKind::Udp,
            udp_ip: DEFAULT_UDP_IP.to_string(),
            udp_port: DEFAULT_DEVICE_PORT,
            tcp_ip: DEFAULT_TCP_IP.to_string(),
            tcp_port: DEFAULT_DEVICE_PORT,
            serial_port: String::new(),
            serial_connected: false,
        }
    }
}

impl ConnectionSettings {
    /// Address of the active network transport (`None` for serial)
    pub fn active_address(&self) -> Option<(&str, u16)> {
        match self.active_type {
            TransportKind::Udp => Some((&self.udp_ip, self.udp_port)),
            TransportKind::Tcp => Some((&self.tcp_ip, self.tcp_port)),
            TransportKind::Serial => None,
        }
    }

    pub fn udp_target(&self) -> Result<SocketAddr> {
        resolve_target(TransportKind::Udp, &self.udp_ip, self.udp_port)
    }

    pub fn tcp_target(&self) -> Result<SocketAddr> {
        resolve_target(TransportKind::Tcp, &self.tcp_ip, self.tcp_port)
    }

    /// Apply a partial update, validating every provided field first
    pub fn apply(&mut self, patch: ConnectionPatch) -> Result<()> {
        let mut next = self.clone();

        if let Some(kind) = patch.active_type {
            next.active_type = kind;
        }

        // `ip`/`port` edit whichever network transport is active after the switch
        if patch.ip.is_some() || patch.port.is_some() {
            if !next.active_type.is_network() {
                return Err(MatrixError::ConfigValidation {
                    field: "ip",
                    reason: "serial transport has no network address".into(),
                });
            }
            let (ip, port) = match next.active_type {
                TransportKind::Tcp => (&mut next.tcp_ip, &mut next.tcp_port),
                _ => (&mut next.udp_ip, &mut next.udp_port),
            };
            if let Some(new_ip) = patch.ip {
                validate_ip(&new_ip)?;
                *ip = new_ip;
            }
            if let Some(new_port) = patch.port {
                validate_port(new_port)?;
                *port = new_port;
            }
        }

        if let Some(ip) = patch.udp_ip {
            validate_ip(&ip)?;
            next.udp_ip = ip;
        }
        if let Some(port) = patch.udp_port {
            validate_port(port)?;
            next.udp_port = port;
        }
        if let Some(ip) = patch.tcp_ip {
            validate_ip(&ip)?;
            next.tcp_ip = ip;
        }
        if let Some(port) = patch.tcp_port {
            validate_port(port)?;
            next.tcp_port = port;
        }
        if let Some(port) = patch.serial_port {
            next.serial_port = port;
        }
        if let Some(connected) = patch.serial_connected {
            next.serial_connected = connected;
        }

        *self = next;
        Ok(())
    }
}

/// Partial update of [`ConnectionSettings`]
///
/// `ip`/`port` target the active network transport; the explicit
/// `udp_*`/`tcp_*` fields target one transport regardless of selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionPatch {
    pub active_type: Option<TransportKind>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub udp_ip: Option<String>,
    pub udp_port: Option<u16>,
    pub tcp_ip: Option<String>,
    pub tcp_port: Option<u16>,
    pub serial_port: Option<String>,
    pub serial_connected: Option<bool>,
}

impl ConnectionPatch {
    pub fn serial_connected(connected: bool) -> Self {
        Self {
            serial_connected: Some(connected),
            ..Default::default()
        }
    }

    pub fn active_type(kind: TransportKind) -> Self {
        Self {
            active_type: Some(kind),
            ..Default::default()
        }
    }
}

/// Read/update access to the connection settings
///
/// Implemented by the persisted [`Store`](super::Store) and by
/// [`MemoryRegistry`] for callers that don't persist anything.
pub trait ConnectionRegistry {
    fn get(&self) -> ConnectionSettings;

    fn update(&mut self, patch: ConnectionPatch) -> Result<ConnectionSettings>;
}

/// Non-persistent registry
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    settings: ConnectionSettings,
}

impl MemoryRegistry {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }
}

impl ConnectionRegistry for MemoryRegistry {
    fn get(&self) -> ConnectionSettings {
        self.settings.clone()
    }

    fn update(&mut self, patch: ConnectionPatch) -> Result<ConnectionSettings> {
        self.settings.apply(patch)?;
        Ok(self.settings.clone())
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check one IPv4 segment as typed by the user
///
/// Digits only, at most three of them, no leading zero, value at most 255.
/// An empty segment is accepted while editing.
pub fn validate_ip_segment(segment: &str) -> Result<()> {
    let invalid = |reason: &str| MatrixError::ConfigValidation {
        field: "ip",
        reason: format!("segment '{}' {}", segment, reason),
    };

    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("must contain digits only"));
    }
    if segment.len() > 3 {
        return Err(invalid("has more than 3 digits"));
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return Err(invalid("has a leading zero"));
    }
    if !segment.is_empty() && segment.parse::<u16>().map(|v| v > 255).unwrap_or(true) {
        return Err(invalid("exceeds 255"));
    }
    Ok(())
}

/// Check a dotted IPv4 address segment by segment
pub fn validate_ip(ip: &str) -> Result<()> {
    let segments: Vec<&str> = ip.split('.').collect();
    if segments.len() != 4 {
        return Err(MatrixError::ConfigValidation {
            field: "ip",
            reason: format!("'{}' must have 4 segments", ip),
        });
    }
    segments.into_iter().try_for_each(validate_ip_segment)
}

pub fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(MatrixError::ConfigValidation {
            field: "port",
            reason: "must be between 1 and 65535".into(),
        });
    }
    Ok(())
}

/// Replace one segment of a dotted address, validating the new text
pub fn set_ip_segment(ip: &str, index: usize, text: &str) -> Result<String> {
    let mut segments: Vec<&str> = ip.split('.').collect();
    segments.resize(4, "");
    if index >= segments.len() {
        return Err(MatrixError::ConfigValidation {
            field: "ip",
            reason: format!("segment index {} out of range", index),
        });
    }
    validate_ip_segment(text)?;
    segments[index] = text;
    Ok(segments[..4].join("."))
}

fn resolve_target(kind: TransportKind, ip: &str, port: u16) -> Result<SocketAddr> {
    if ip.trim().is_empty() {
        return Err(MatrixError::MissingTarget {
            transport: kind.name(),
        });
    }
    let addr: Ipv4Addr = ip.parse().map_err(|_| MatrixError::ConfigValidation {
        field: "ip",
        reason: format!("'{}' is not a complete IPv4 address", ip),
    })?;
    validate_port(port)?;
    Ok(SocketAddr::from((addr, port)))
}

// ============================================================================
// Tests
// ============================================================================
