//! Connection page operations

use super::App;
use crate::codec::Command;
use crate::error::{MatrixError, Result};
use crate::sender::Delivery;
use crate::state::{self, ConnectionPatch, ConnectionRegistry, ConnectionSettings};
use crate::transport::PortInfo;
use tracing::warn;

impl App {
    /// Apply a partial update to the connection registry
    pub fn update_connection(&mut self, patch: ConnectionPatch) -> Result<ConnectionSettings> {
        let previous = self.store.get().active_type;
        let settings = ConnectionRegistry::update(&mut self.store, patch)?;
        if settings.active_type != previous {
            self.log_system(format!("Transport switched to {}", settings.active_type));
        }
        Ok(settings)
    }

    /// Edit one octet of the active network transport's address
    pub fn set_ip_segment(&mut self, index: usize, text: &str) -> Result<ConnectionSettings> {
        let current = self.store.get();
        let Some((ip, _)) = current.active_address() else {
            return Err(MatrixError::ConfigValidation {
                field: "ip",
                reason: "serial transport has no network address".into(),
            });
        };
        let ip = state::set_ip_segment(ip, index, text)?;
        ConnectionRegistry::update(
            &mut self.store,
            ConnectionPatch {
                ip: Some(ip),
                ..Default::default()
            },
        )
    }

    /// Connectivity probe over the active transport
    pub async fn test(&mut self) -> Result<Delivery> {
        self.dispatch(&Command::Test).await
    }

    /// Bring the cached `serial_connected` flag in line with the live link
    pub fn reconcile_serial(&mut self) {
        let live = self.sender.is_open();
        if self.store.get().serial_connected == live {
            return;
        }
        if let Err(e) =
            ConnectionRegistry::update(&mut self.store, ConnectionPatch::serial_connected(live))
        {
            warn!(error = %e, "Failed to persist serial state");
        }
    }

    // =========================================================================
    // Serial
    // =========================================================================

    /// Enumerate serial ports, dropping a configured port that disappeared
    pub fn list_ports(&mut self) -> Result<Vec<PortInfo>> {
        let ports = self.sender.list_ports()?;
        let configured = self.store.get().serial_port;

        if !configured.is_empty() && !ports.iter().any(|p| p.id == configured) {
            if self.sender.connected_port() == Some(configured.as_str()) {
                self.sender.disconnect_serial();
            }
            ConnectionRegistry::update(
                &mut self.store,
                ConnectionPatch {
                    serial_port: Some(String::new()),
                    serial_connected: Some(false),
                    ..Default::default()
                },
            )?;
            self.log_system(format!("Serial port {} is no longer available", configured));
        }

        Ok(ports)
    }

    /// Connect to `port`, or to the configured port when `None`
    pub async fn connect_serial(&mut self, port: Option<&str>) -> Result<()> {
        let port_id = match port {
            Some(id) => id.to_string(),
            None => self.store.get().serial_port,
        };
        if port_id.is_empty() {
            return Err(MatrixError::NoSerialPortSelected);
        }

        let display_name = self
            .sender
            .list_ports()
            .ok()
            .and_then(|ports| ports.into_iter().find(|p| p.id == port_id))
            .map(|p| p.display_name)
            .unwrap_or_else(|| port_id.clone());

        match self.sender.connect_serial(&port_id, &display_name).await {
            Ok(()) => {
                ConnectionRegistry::update(
                    &mut self.store,
                    ConnectionPatch {
                        serial_port: Some(port_id),
                        serial_connected: Some(true),
                        ..Default::default()
                    },
                )?;
                self.log_system(format!("Serial port connected: {}", display_name));
                Ok(())
            }
            Err(e) => {
                self.reconcile_serial();
                self.log_system(format!("Serial connect failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn disconnect_serial(&mut self) -> Result<()> {
        let port = self.sender.connected_port().map(str::to_string);
        self.sender.disconnect_serial();
        ConnectionRegistry::update(&mut self.store, ConnectionPatch::serial_connected(false))?;
        if let Some(port) = port {
            self.log_system(format!("Serial port disconnected: {}", port));
        }
        Ok(())
    }
}
