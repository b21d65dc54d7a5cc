//! Integration tests for the command path
//!
//! Drives `App` end to end: persisted store on disk, real loopback UDP/TCP
//! sockets, and a mock serial host standing in for the hardware.

use matrix_link::app::App;
use matrix_link::error::MatrixError;
use matrix_link::sender::{CommandSender, SenderOptions};
use matrix_link::shell;
use matrix_link::state::{ConnectionPatch, ConnectionRegistry, Store};
use matrix_link::transport::{OpenError, PortInfo, SerialHandle, SerialHost, TransportKind};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};

// =============================================================================
// Mock Serial Host
// =============================================================================

#[derive(Default)]
struct Device {
    plugged: bool,
    written: Vec<Vec<u8>>,
}

/// One fake serial device on `COM7`
#[derive(Clone, Default)]
struct FakeSerial {
    device: Arc<Mutex<Device>>,
}

impl FakeSerial {
    fn plugged() -> Self {
        let fake = Self::default();
        fake.device.lock().plugged = true;
        fake
    }

    fn unplug(&self) {
        self.device.lock().plugged = false;
    }

    fn written(&self) -> Vec<Vec<u8>> {
        self.device.lock().written.clone()
    }
}

impl SerialHost for FakeSerial {
    fn list_ports(&self) -> matrix_link::Result<Vec<PortInfo>> {
        if !self.device.lock().plugged {
            return Ok(Vec::new());
        }
        Ok(vec![PortInfo {
            id: "COM7".into(),
            display_name: "Matrix USB (COM7)".into(),
        }])
    }

    fn request_port(&self, id: &str) -> matrix_link::Result<Box<dyn SerialHandle>> {
        if id != "COM7" || !self.device.lock().plugged {
            return Err(MatrixError::SerialOpen {
                port: id.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such port"),
            });
        }
        Ok(Box::new(FakeHandle {
            device: Arc::clone(&self.device),
            open: false,
        }))
    }
}

struct FakeHandle {
    device: Arc<Mutex<Device>>,
    open: bool,
}

impl SerialHandle for FakeHandle {
    fn open(&mut self, baud_rate: u32) -> Result<(), OpenError> {
        assert_eq!(baud_rate, 9600);
        self.open = true;
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.open && self.device.lock().plugged
    }

    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut device = self.device.lock();
        if !device.plugged {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "unplugged",
            ));
        }
        device.written.push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.open = false;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn open_app(state_path: &Path, serial: &FakeSerial) -> App {
    let store = Store::open(state_path).unwrap();
    let sender = CommandSender::new(
        Arc::new(serial.clone()),
        SenderOptions {
            // Any free local port; 5000 may be taken on a CI box
            udp_local_port: 0,
            ..Default::default()
        },
    );
    App::new(store, sender, 100)
}

async fn recv_datagram(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = [0u8; 64];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("timeout waiting for datagram")
        .unwrap();
    buf[..len].to_vec()
}

// =============================================================================
// Network transports
// =============================================================================

#[tokio::test]
async fn test_udp_switch_reaches_device() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = device.local_addr().unwrap().port();

    let mut app = open_app(&state_path, &FakeSerial::default());
    app.update_connection(ConnectionPatch {
        ip: Some("127.0.0.1".into()),
        port: Some(port),
        ..Default::default()
    })
    .unwrap();

    app.switch(3, [5, 1, 2]).await.unwrap();
    assert_eq!(recv_datagram(&device).await, b"3V1,2,5.");

    app.switch_all(4).await.unwrap();
    assert_eq!(recv_datagram(&device).await, b"4TOALL");
}

#[tokio::test]
async fn test_tcp_after_switching_transport() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        socket.read_to_end(&mut buf).await.unwrap();
        buf
    });

    let mut app = open_app(&state_path, &FakeSerial::default());
    let original_udp = app.connection();
    app.update_connection(ConnectionPatch {
        active_type: Some(TransportKind::Tcp),
        ip: Some("127.0.0.1".into()),
        port: Some(port),
        ..Default::default()
    })
    .unwrap();

    app.set_osd(true).await.unwrap();
    let received = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("timeout")
        .unwrap();
    assert_eq!(received, b"OSDON");

    // UDP address survives the round trip through TCP
    let back = app
        .update_connection(ConnectionPatch::active_type(TransportKind::Udp))
        .unwrap();
    assert_eq!(back.udp_ip, original_udp.udp_ip);
    assert_eq!(back.udp_port, original_udp.udp_port);
}

#[tokio::test]
async fn test_send_failure_is_reported_and_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = closed.local_addr().unwrap().port();
    drop(closed);

    let mut app = open_app(&state_path, &FakeSerial::default());
    app.update_connection(ConnectionPatch {
        active_type: Some(TransportKind::Tcp),
        ip: Some("127.0.0.1".into()),
        port: Some(port),
        ..Default::default()
    })
    .unwrap();

    let err = app.factory_reset().await.unwrap_err();
    assert!(matches!(err, MatrixError::TcpConnect { .. }));
    assert!(app.logs().last().unwrap().is_failure());

    // Still accepting commands
    assert!(app.factory_reset().await.is_err());
    let failures = app.logs().entries().iter().filter(|e| e.is_failure()).count();
    assert_eq!(failures, 2);
}

// =============================================================================
// Serial lifecycle
// =============================================================================

#[tokio::test]
async fn test_serial_unplug_persists_disconnected_flag() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let serial = FakeSerial::plugged();

    let mut app = open_app(&state_path, &serial);
    app.update_connection(ConnectionPatch::active_type(TransportKind::Serial))
        .unwrap();
    app.connect_serial(Some("COM7")).await.unwrap();
    app.set_buzzer(true).await.unwrap();
    assert_eq!(serial.written(), vec![b"BUZON".to_vec()]);

    serial.unplug();
    let err = app.set_buzzer(false).await.unwrap_err();
    assert!(matches!(err, MatrixError::SerialNotOpen));
    assert!(!app.sender().is_open());

    let reopened = Store::open(&state_path).unwrap();
    let settings = reopened.get();
    assert_eq!(settings.serial_port, "COM7");
    assert!(!settings.serial_connected);
    assert!(reopened.state().hardware_settings.buzzer_enabled);
}

#[tokio::test]
async fn test_stale_connected_flag_reconciled_on_start() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    {
        let mut store = Store::open(&state_path).unwrap();
        ConnectionRegistry::update(
            &mut store,
            ConnectionPatch {
                active_type: Some(TransportKind::Serial),
                serial_port: Some("COM7".into()),
                serial_connected: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    }

    let app = open_app(&state_path, &FakeSerial::plugged());
    assert!(!app.connection().serial_connected);
    assert!(!Store::open(&state_path).unwrap().get().serial_connected);
}

#[tokio::test]
async fn test_vanished_port_cleared_on_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let serial = FakeSerial::plugged();

    let mut app = open_app(&state_path, &serial);
    app.connect_serial(Some("COM7")).await.unwrap();

    serial.unplug();
    assert!(app.list_ports().unwrap().is_empty());
    assert_eq!(app.connection().serial_port, "");
    assert!(!app.sender().is_open());
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_scenes_and_groups_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let serial = FakeSerial::plugged();

    {
        let mut app = open_app(&state_path, &serial);
        app.update_connection(ConnectionPatch {
            active_type: Some(TransportKind::Serial),
            serial_port: Some("COM7".into()),
            ..Default::default()
        })
        .unwrap();
        app.connect_serial(None).await.unwrap();

        app.switch(2, [1, 3]).await.unwrap();
        app.save_scene(Some(4), Some("Stage")).await.unwrap();
        app.splice([1, 2, 6, 7]).await.unwrap();
        app.disconnect_serial().unwrap();
    }

    let app = open_app(&state_path, &serial);
    assert_eq!(app.scenes().len(), 1);
    assert_eq!(app.scenes()[0].name, "Stage");
    assert_eq!(app.scenes()[0].path_summary(), "2->1,3");
    assert_eq!(app.splicing_groups().len(), 1);
    assert_eq!(app.expand_selection(7).len(), 4);
}

#[test]
fn test_legacy_document_loads() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    std::fs::write(
        &state_path,
        r#"{
            "connectionSettings": {"type": "UDP", "ip": "10.1.2.3", "port": 7000},
            "scenes": [{"id": 2, "name": "Old", "records": [], "timestamp": 0}],
            "splicingSettings": {"rows": 2, "cols": 3}
        }"#,
    )
    .unwrap();

    let store = Store::open(&state_path).unwrap();
    let settings = store.get();
    assert_eq!(settings.active_type, TransportKind::Udp);
    assert_eq!(settings.udp_ip, "10.1.2.3");
    assert_eq!(settings.udp_port, 7000);
    assert_eq!(settings.tcp_ip, "192.168.1.100");
    assert_eq!(store.state().scenes[0].name, "Old");
    assert_eq!(store.state().splicing_settings.tile_count(), 6);
}

// =============================================================================
// Shell
// =============================================================================

#[tokio::test]
async fn test_shell_drives_udp_device() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = device.local_addr().unwrap().port();

    let mut app = open_app(&state_path, &FakeSerial::default());
    let script = format!(
        "connection set --ip 127.0.0.1 --port {}\nsend --hex A5 5A 00 AA\nlog 1\nquit\n",
        port
    );
    let mut output = Vec::new();
    shell::run_with(&mut app, script.as_bytes(), &mut output)
        .await
        .unwrap();

    assert_eq!(recv_datagram(&device).await, vec![0xA5, 0x5A, 0x00, 0xAA]);
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Sent 4 bytes via UDP"));
    assert!(output.contains("A5 5A 00 AA (4 B)"));
}
