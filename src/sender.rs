//! Command sender
//!
//! Orchestrates one send: reads the connection registry, encodes the
//! command, picks the backend for the active transport and reports the
//! outcome. Owns the serial link, since serial is the only transport with
//! state between sends.
//!
//! Failure policy:
//! - Nothing is retried; every failure is returned once to the caller.
//! - Encoding and addressing problems are caught before any I/O.
//! - Serial failures also clear the registry's cached `serial_connected`
//!   flag so the UI can't show a stale "connected" indicator.

use crate::codec::{self, Encoding};
use crate::constants::{SERIAL_BAUD_RATE, UDP_LOCAL_PORT};
use crate::error::{MatrixError, Result};
use crate::state::{ConnectionPatch, ConnectionRegistry, ConnectionSettings};
use crate::transport::{
    OpenError, PortInfo, SerialHandle, SerialHost, SerialLink, SystemSerial, TcpTransport,
    Transport, TransportKind, UdpTransport,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Backend tuning taken from the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderOptions {
    /// Local port every UDP datagram is sent from
    pub udp_local_port: u16,
    pub serial_baud_rate: u32,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            udp_local_port: UDP_LOCAL_PORT,
            serial_baud_rate: SERIAL_BAUD_RATE,
        }
    }
}

/// Successful delivery of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub transport: TransportKind,
    pub bytes: usize,
}

/// Backend chosen for one send
enum Backend<'a> {
    Udp(UdpTransport),
    Tcp(TcpTransport),
    Serial(&'a mut SerialLink),
}

impl Transport for Backend<'_> {
    fn kind(&self) -> TransportKind {
        match self {
            Self::Udp(t) => t.kind(),
            Self::Tcp(t) => t.kind(),
            Self::Serial(link) => link.kind(),
        }
    }

    async fn send(&mut self, payload: Bytes) -> Result<()> {
        match self {
            Self::Udp(t) => t.send(payload).await,
            Self::Tcp(t) => t.send(payload).await,
            Self::Serial(link) => link.send(payload).await,
        }
    }
}

/// Sends commands over the active transport
///
/// # Example
///
/// ```ignore
/// let mut sender = CommandSender::system(SenderOptions::default());
/// let mut registry = MemoryRegistry::default();
/// sender.send(&mut registry, "3V1,2,5.", Encoding::Text).await?;
/// ```
pub struct CommandSender {
    host: Arc<dyn SerialHost>,
    serial: SerialLink,
    options: SenderOptions,
}

impl CommandSender {
    pub fn new(host: Arc<dyn SerialHost>, options: SenderOptions) -> Self {
        Self {
            host,
            serial: SerialLink::Disconnected,
            options,
        }
    }

    /// Sender using the machine's real serial ports
    pub fn system(options: SenderOptions) -> Self {
        Self::new(Arc::new(SystemSerial), options)
    }

    pub fn options(&self) -> SenderOptions {
        self.options
    }

    pub fn list_ports(&self) -> Result<Vec<PortInfo>> {
        self.host.list_ports()
    }

    /// True iff a serial handle exists and is readable
    pub fn is_open(&self) -> bool {
        self.serial.is_open()
    }

    pub fn connected_port(&self) -> Option<&str> {
        self.serial.port_id()
    }

    pub fn connected_display_name(&self) -> Option<&str> {
        self.serial.display_name()
    }

    // =========================================================================
    // Send
    // =========================================================================

    /// Send one command over the registry's active transport
    pub async fn send<R>(
        &mut self,
        registry: &mut R,
        command: &str,
        encoding: Encoding,
    ) -> Result<Delivery>
    where
        R: ConnectionRegistry + ?Sized,
    {
        if command.trim().is_empty() {
            return Err(MatrixError::ConfigValidation {
                field: "command",
                reason: "command is empty".into(),
            });
        }

        let settings = registry.get();
        let payload = codec::encode(command, encoding)?;
        let bytes = payload.len();

        debug!(
            transport = %settings.active_type,
            command,
            %encoding,
            "Sending command"
        );

        let result = {
            let mut backend = self.select_backend(registry, &settings)?;
            backend.send(payload).await
        };

        match result {
            Ok(()) => Ok(Delivery {
                transport: settings.active_type,
                bytes,
            }),
            Err(e) => {
                warn!(transport = %settings.active_type, command, error = %e, "Send failed");
                if settings.active_type == TransportKind::Serial {
                    self.serial.close();
                    mark_serial_disconnected(registry);
                }
                Err(e)
            }
        }
    }

    /// Pre-flight checks and backend selection; no I/O happens here
    fn select_backend<R>(
        &mut self,
        registry: &mut R,
        settings: &ConnectionSettings,
    ) -> Result<Backend<'_>>
    where
        R: ConnectionRegistry + ?Sized,
    {
        match settings.active_type {
            TransportKind::Udp => Ok(Backend::Udp(UdpTransport::new(
                settings.udp_target()?,
                self.options.udp_local_port,
            ))),
            TransportKind::Tcp => Ok(Backend::Tcp(TcpTransport::new(settings.tcp_target()?))),
            TransportKind::Serial => {
                let configured = settings.serial_port.as_str();
                if let Some(connected) = self.serial.port_id() {
                    if !configured.is_empty() && configured != connected {
                        warn!(configured, connected, "Serial port mismatch");
                        return Err(MatrixError::SerialPortMismatch {
                            configured: configured.to_string(),
                            connected: connected.to_string(),
                        });
                    }
                }

                if !self.serial.is_open() {
                    self.serial.close();
                    mark_serial_disconnected(registry);
                    return Err(MatrixError::SerialNotOpen);
                }

                Ok(Backend::Serial(&mut self.serial))
            }
        }
    }

    // =========================================================================
    // Serial lifecycle
    // =========================================================================

    /// Connect the serial link to `port_id`
    ///
    /// No-op when already connected to the same port. A link to another port
    /// is closed first. Opening blocks, so it runs on the blocking pool.
    pub async fn connect_serial(&mut self, port_id: &str, display_name: &str) -> Result<()> {
        if port_id.is_empty() {
            return Err(MatrixError::NoSerialPortSelected);
        }

        if self.serial.is_open() && self.serial.port_id() == Some(port_id) {
            debug!(port = port_id, "Already connected");
            return Ok(());
        }

        if let Some(previous) = self.serial.close() {
            info!(from = %previous, to = port_id, "Switching serial port");
        }

        let host = Arc::clone(&self.host);
        let id = port_id.to_string();
        let baud_rate = self.options.serial_baud_rate;
        let opened = tokio::task::spawn_blocking(move || open_port(host.as_ref(), &id, baud_rate))
            .await
            .map_err(|e| MatrixError::Runtime {
                source: std::io::Error::other(e.to_string()),
            })?;

        match opened {
            Ok(handle) => {
                self.serial = SerialLink::connected(port_id, display_name, handle);
                info!(port = port_id, baud_rate, "Serial port connected");
                Ok(())
            }
            Err(e) => {
                self.serial = SerialLink::Disconnected;
                warn!(port = port_id, error = %e, "Serial connect failed");
                Err(e)
            }
        }
    }

    /// Close the serial link; close errors are ignored and state is always cleared
    pub fn disconnect_serial(&mut self) {
        if let Some(port) = self.serial.close() {
            info!(port = %port, "Serial port disconnected");
        }
    }
}

fn open_port(host: &dyn SerialHost, port_id: &str, baud_rate: u32) -> Result<Box<dyn SerialHandle>> {
    let mut handle = host.request_port(port_id)?;
    match handle.open(baud_rate) {
        Ok(()) => Ok(handle),
        // Only usable if this handle can actually reach the port
        Err(OpenError::AlreadyOpen) if handle.is_readable() => {
            warn!(port = port_id, "Port reported already open, using it as is");
            Ok(handle)
        }
        Err(OpenError::AlreadyOpen) => Err(MatrixError::SerialOpen {
            port: port_id.to_string(),
            source: std::io::Error::other("port is held by another handle"),
        }),
        Err(OpenError::Failed(source)) => Err(MatrixError::SerialOpen {
            port: port_id.to_string(),
            source,
        }),
    }
}

fn mark_serial_disconnected<R>(registry: &mut R)
where
    R: ConnectionRegistry + ?Sized,
{
    if let Err(e) = registry.update(ConnectionPatch::serial_connected(false)) {
        warn!(error = %e, "Failed to persist serial disconnect");
    }
}

// ============================================================================
// Tests
// ============================================================================
