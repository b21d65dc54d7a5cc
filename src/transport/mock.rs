//! Scriptable serial host for unit tests

use super::serial::{OpenError, PortInfo, SerialHandle, SerialHost};
use crate::error::{MatrixError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    ports: Vec<PortInfo>,
    written: Vec<(String, Vec<u8>)>,
    requests: usize,
    closes: usize,
    already_open: bool,
    busy: bool,
    open_failure: Option<std::io::ErrorKind>,
    readable: bool,
    fail_close: bool,
}

/// Serial host with in-memory ports
///
/// Every handle shares the host's state, so tests can unplug the device
/// (`set_readable(false)`) after connecting and inspect written bytes.
#[derive(Clone, Default)]
pub struct MockSerialHost {
    state: Arc<Mutex<MockState>>,
}

impl MockSerialHost {
    pub fn with_ports(ids: &[&str]) -> Self {
        let host = Self::default();
        {
            let mut state = host.state.lock();
            state.readable = true;
            state.ports = ids
                .iter()
                .map(|id| PortInfo {
                    id: id.to_string(),
                    display_name: format!("USB Serial ({})", id),
                })
                .collect();
        }
        host
    }

    pub fn set_readable(&self, readable: bool) {
        self.state.lock().readable = readable;
    }

    pub fn report_already_open(&self, already_open: bool) {
        self.state.lock().already_open = already_open;
    }

    /// Open reports "already open" but the handle never gets a port,
    /// as when another process holds it
    pub fn report_busy(&self) {
        self.state.lock().busy = true;
    }

    pub fn fail_open(&self, kind: std::io::ErrorKind) {
        self.state.lock().open_failure = Some(kind);
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.lock().fail_close = fail;
    }

    pub fn written(&self) -> Vec<(String, Vec<u8>)> {
        self.state.lock().written.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }
}

impl SerialHost for MockSerialHost {
    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        Ok(self.state.lock().ports.clone())
    }

    fn request_port(&self, id: &str) -> Result<Box<dyn SerialHandle>> {
        let mut state = self.state.lock();
        state.requests += 1;
        if !state.ports.iter().any(|p| p.id == id) {
            return Err(MatrixError::SerialOpen {
                port: id.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "port not found"),
            });
        }
        Ok(Box::new(MockHandle {
            id: id.to_string(),
            open: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockHandle {
    id: String,
    open: bool,
    state: Arc<Mutex<MockState>>,
}

impl SerialHandle for MockHandle {
    fn open(&mut self, _baud_rate: u32) -> std::result::Result<(), OpenError> {
        let state = self.state.lock();
        if let Some(kind) = state.open_failure {
            return Err(OpenError::Failed(std::io::Error::new(kind, "open failed")));
        }
        if state.busy {
            return Err(OpenError::AlreadyOpen);
        }
        // An already-open port still ends up usable
        self.open = true;
        if state.already_open {
            return Err(OpenError::AlreadyOpen);
        }
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.open && self.state.lock().readable
    }

    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock();
        if !self.open || !state.readable {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device gone",
            ));
        }
        state.written.push((self.id.clone(), data.to_vec()));
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        let mut state = self.state.lock();
        state.closes += 1;
        self.open = false;
        if state.fail_close {
            return Err(std::io::Error::other("close failed"));
        }
        Ok(())
    }
}
