//! Centralized error types
//!
//! All failures are represented by the `MatrixError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, MatrixError>`.
//!
//! Every error is local to the command that produced it: nothing here is
//! fatal to the process, and callers keep accepting commands afterwards.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Broad classification used when reporting failures to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing settings, rejected before any I/O
    Configuration,
    /// Socket or serial failure during I/O
    Transport,
    /// Stale or invalid state, rejected before any I/O
    Consistency,
    /// Local files and runtime
    Persistence,
}

/// All matrix-link errors
#[derive(Debug)]
pub enum MatrixError {
    // === Configuration ===
    /// Invalid value for a setting or argument
    ConfigValidation { field: &'static str, reason: String },
    /// No address configured for the active network transport
    MissingTarget { transport: &'static str },
    /// Serial transport selected but no port chosen
    NoSerialPortSelected,

    // === Transport ===
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// Failed to write to an open serial port
    SerialWrite {
        port: String,
        source: std::io::Error,
    },
    /// Failed to enumerate serial ports
    PortEnumeration { source: std::io::Error },
    /// Failed to bind the local UDP socket
    UdpBind { port: u16, source: std::io::Error },
    /// Failed to send a UDP datagram
    UdpSend {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// Failed to connect to the TCP target
    TcpConnect {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// Failed to write on an established TCP connection
    TcpWrite {
        addr: SocketAddr,
        source: std::io::Error,
    },

    // === Consistency ===
    /// Serial transport selected but the port is not open
    SerialNotOpen,
    /// Configured serial port differs from the one physically open
    SerialPortMismatch { configured: String, connected: String },
    /// Tile or channel selection rejected
    InvalidSelection { reason: String },
    /// Selected tiles do not form a rectangle on the grid
    NotRectangle,
    /// Tile already belongs to a splicing group
    TileAlreadySpliced { tile: u8 },
    /// No scene stored under this id
    UnknownScene { id: u8 },

    // === Codec ===
    /// Hex command text is not a sequence of hex byte pairs
    HexDecode { input: String },

    // === Persistence ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// State or config could not be serialized
    Encode { what: &'static str, reason: String },
    /// Another process already owns the state document
    InstanceAlreadyRunning { lock_path: PathBuf },
    /// Failed to take or create the instance lock
    InstanceLock {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Runtime ===
    /// Tokio runtime creation or blocking task failed
    Runtime { source: std::io::Error },
}

impl MatrixError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidation { .. }
            | Self::MissingTarget { .. }
            | Self::NoSerialPortSelected
            | Self::HexDecode { .. } => ErrorCategory::Configuration,
            Self::SerialOpen { .. }
            | Self::SerialWrite { .. }
            | Self::PortEnumeration { .. }
            | Self::UdpBind { .. }
            | Self::UdpSend { .. }
            | Self::TcpConnect { .. }
            | Self::TcpWrite { .. } => ErrorCategory::Transport,
            Self::SerialNotOpen
            | Self::SerialPortMismatch { .. }
            | Self::InvalidSelection { .. }
            | Self::NotRectangle
            | Self::TileAlreadySpliced { .. }
            | Self::UnknownScene { .. } => ErrorCategory::Consistency,
            Self::Io { .. }
            | Self::Encode { .. }
            | Self::InstanceAlreadyRunning { .. }
            | Self::InstanceLock { .. }
            | Self::Runtime { .. } => ErrorCategory::Persistence,
        }
    }

    /// Shorthand for selection errors
    pub fn selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }
}

impl std::error::Error for MatrixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerialOpen { source, .. }
            | Self::SerialWrite { source, .. }
            | Self::PortEnumeration { source }
            | Self::UdpBind { source, .. }
            | Self::UdpSend { source, .. }
            | Self::TcpConnect { source, .. }
            | Self::TcpWrite { source, .. }
            | Self::Io { source, .. }
            | Self::InstanceLock { source, .. }
            | Self::Runtime { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigValidation { field, reason } => write!(f, "Invalid {}: {}", field, reason),
            Self::MissingTarget { transport } => {
                write!(f, "No target address configured for {}", transport)
            }
            Self::NoSerialPortSelected => write!(f, "No serial port selected"),
            Self::SerialOpen { port, source } => {
                write!(f, "Cannot open serial port {}: {}", port, source)
            }
            Self::SerialWrite { port, source } => {
                write!(f, "Serial write to {} failed: {}", port, source)
            }
            Self::PortEnumeration { source } => write!(f, "Cannot list serial ports: {}", source),
            Self::UdpBind { port, source } => write!(f, "Cannot bind UDP port {}: {}", port, source),
            Self::UdpSend { addr, source } => write!(f, "UDP send to {} failed: {}", addr, source),
            Self::TcpConnect { addr, source } => {
                write!(f, "Cannot connect to {}: {}", addr, source)
            }
            Self::TcpWrite { addr, source } => write!(f, "TCP write to {} failed: {}", addr, source),
            Self::SerialNotOpen => {
                write!(f, "Serial port is disconnected, reconnect it from the connection settings")
            }
            Self::SerialPortMismatch {
                configured,
                connected,
            } => write!(
                f,
                "Configured serial port ({}) differs from connected port ({}), reconnect",
                configured, connected
            ),
            Self::InvalidSelection { reason } => write!(f, "Invalid selection: {}", reason),
            Self::NotRectangle => write!(f, "Selected screens do not form a rectangle"),
            Self::TileAlreadySpliced { tile } => {
                write!(f, "Screen {} already belongs to a spliced group", tile)
            }
            Self::UnknownScene { id } => write!(f, "Scene {} does not exist", id),
            Self::HexDecode { input } => write!(f, "Invalid hex command: {:?}", input),
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::Encode { what, reason } => write!(f, "Cannot serialize {}: {}", what, reason),
            Self::InstanceAlreadyRunning { lock_path } => write!(
                f,
                "mxl is already running (lock: {})",
                lock_path.display()
            ),
            Self::InstanceLock { path, .. } => {
                write!(f, "Cannot lock instance file: {}", path.display())
            }
            Self::Runtime { source } => write!(f, "Runtime failure: {}", source),
        }
    }
}

/// Alias for Result with MatrixError
pub type Result<T> = std::result::Result<T, MatrixError>;
