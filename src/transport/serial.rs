//! Serial transport
//!
//! The only stateful backend. A port is requested from a [`SerialHost`],
//! opened once at the switcher's fixed baud rate and kept in a
//! [`SerialLink`] until it is explicitly disconnected or found dead.
//!
//! Writes go through a mutex around the handle so two writes can never
//! interleave their bytes, and run on tokio's blocking pool since the
//! `serialport` crate is synchronous.

use super::{Transport, TransportKind};
use crate::constants::SERIAL_TIMEOUT_MS;
use crate::error::{MatrixError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use serialport::{SerialPortInfo, SerialPortType};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Host capability
// =============================================================================

/// A serial port as listed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Stable identifier used to request the port (`COM3`, `/dev/ttyUSB0`)
    pub id: String,
    /// Human readable name (USB product string when known)
    pub display_name: String,
}

/// Why opening a port failed
#[derive(Debug)]
pub enum OpenError {
    /// The port is already open; the existing handle is assumed usable
    AlreadyOpen,
    /// Any other failure
    Failed(std::io::Error),
}

/// An individual serial port owned by the sender while connected
pub trait SerialHandle: Send {
    fn open(&mut self, baud_rate: u32) -> std::result::Result<(), OpenError>;

    /// Liveness check: the port is open and still usable
    fn is_readable(&self) -> bool;

    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()>;

    fn close(&mut self) -> std::io::Result<()>;
}

/// Access to the machine's serial ports
pub trait SerialHost: Send + Sync {
    fn list_ports(&self) -> Result<Vec<PortInfo>>;

    /// Get a handle for the port with this id (not yet opened)
    fn request_port(&self, id: &str) -> Result<Box<dyn SerialHandle>>;
}

// =============================================================================
// System implementation
// =============================================================================

/// Serial host backed by the `serialport` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerial;

impl SerialHost for SystemSerial {
    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        let ports = serialport::available_ports().map_err(|e| MatrixError::PortEnumeration {
            source: std::io::Error::other(e.to_string()),
        })?;
        Ok(ports.iter().map(port_info).collect())
    }

    fn request_port(&self, id: &str) -> Result<Box<dyn SerialHandle>> {
        let known = self.list_ports()?.iter().any(|p| p.id == id);
        if !known {
            return Err(MatrixError::SerialOpen {
                port: id.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "port not found"),
            });
        }
        Ok(Box::new(SystemPort {
            name: id.to_string(),
            port: None,
        }))
    }
}

fn port_info(port: &SerialPortInfo) -> PortInfo {
    let display_name = match &port.port_type {
        SerialPortType::UsbPort(usb) => match (&usb.product, &usb.manufacturer) {
            (Some(product), _) => format!("{} ({})", product, port.port_name),
            (None, Some(manufacturer)) => format!("{} ({})", manufacturer, port.port_name),
            (None, None) => port.port_name.clone(),
        },
        _ => port.port_name.clone(),
    };

    PortInfo {
        id: port.port_name.clone(),
        display_name,
    }
}

/// A physical port opened through `serialport`
struct SystemPort {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialHandle for SystemPort {
    fn open(&mut self, baud_rate: u32) -> std::result::Result<(), OpenError> {
        if self.port.is_some() {
            return Err(OpenError::AlreadyOpen);
        }

        match serialport::new(&self.name, baud_rate)
            .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()
        {
            Ok(port) => {
                self.port = Some(port);
                Ok(())
            }
            Err(e) if is_already_open(&e) => Err(OpenError::AlreadyOpen),
            Err(e) => Err(OpenError::Failed(std::io::Error::other(e.to_string()))),
        }
    }

    fn is_readable(&self) -> bool {
        self.port
            .as_ref()
            .map(|p| p.bytes_to_read().is_ok())
            .unwrap_or(false)
    }

    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self.port.as_mut() {
            Some(port) => {
                port.write_all(data)?;
                port.flush()
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "port not open",
            )),
        }
    }

    fn close(&mut self) -> std::io::Result<()> {
        // Dropping the handle closes the file descriptor
        self.port.take();
        Ok(())
    }
}

/// Busy/exclusive-access errors mean another handle holds the port
fn is_already_open(e: &serialport::Error) -> bool {
    let description = e.description.to_ascii_lowercase();
    description.contains("already open") || description.contains("busy")
}

// =============================================================================
// Link state
// =============================================================================

/// Serial connection state
///
/// `Disconnected -(connect)-> Connected -(disconnect | failed check)-> Disconnected`
#[derive(Default)]
pub enum SerialLink {
    #[default]
    Disconnected,
    Connected {
        port_id: String,
        display_name: String,
        handle: Arc<Mutex<Box<dyn SerialHandle>>>,
    },
}

impl SerialLink {
    pub fn connected(port_id: &str, display_name: &str, handle: Box<dyn SerialHandle>) -> Self {
        Self::Connected {
            port_id: port_id.to_string(),
            display_name: display_name.to_string(),
            handle: Arc::new(Mutex::new(handle)),
        }
    }

    /// True iff a handle exists and reports itself readable
    pub fn is_open(&self) -> bool {
        match self {
            Self::Connected { handle, .. } => handle.lock().is_readable(),
            Self::Disconnected => false,
        }
    }

    pub fn port_id(&self) -> Option<&str> {
        match self {
            Self::Connected { port_id, .. } => Some(port_id),
            Self::Disconnected => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Connected { display_name, .. } => Some(display_name),
            Self::Disconnected => None,
        }
    }

    /// Close the handle (errors ignored) and return to `Disconnected`
    ///
    /// Returns the id of the port that was connected, if any.
    pub fn close(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Connected {
                port_id, handle, ..
            } => {
                if let Err(e) = handle.lock().close() {
                    debug!(port = %port_id, error = %e, "Serial close failed, ignoring");
                }
                Some(port_id)
            }
            Self::Disconnected => None,
        }
    }
}

impl Transport for SerialLink {
    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    async fn send(&mut self, payload: Bytes) -> Result<()> {
        let (port, handle) = match self {
            Self::Connected {
                port_id, handle, ..
            } => (port_id.clone(), Arc::clone(handle)),
            Self::Disconnected => return Err(MatrixError::SerialNotOpen),
        };

        let write_port = port.clone();
        let written = tokio::task::spawn_blocking(move || {
            // Guard is released when the closure returns, even on error
            let mut guard = handle.lock();
            guard.write_all(&payload).map(|_| payload.len())
        })
        .await
        .map_err(|e| MatrixError::SerialWrite {
            port: port.clone(),
            source: std::io::Error::other(e.to_string()),
        })?
        .map_err(|source| MatrixError::SerialWrite {
            port: write_port,
            source,
        })?;

        debug!(port = %port, bytes = written, "Serial command written");
        Ok(())
    }
}
