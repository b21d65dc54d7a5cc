//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Network
// =============================================================================

/// Local port bound for every outgoing UDP datagram
pub const UDP_LOCAL_PORT: u16 = 5000;

/// Default device address for UDP
pub const DEFAULT_UDP_IP: &str = "192.168.1.200";

/// Default device address for TCP
pub const DEFAULT_TCP_IP: &str = "192.168.1.100";

/// Default device port (UDP and TCP)
pub const DEFAULT_DEVICE_PORT: u16 = 6789;

// =============================================================================
// Serial
// =============================================================================

/// Fixed baud rate of the switcher's serial interface
pub const SERIAL_BAUD_RATE: u32 = 9600;

/// Driver-level read/write timeout for the serial port (milliseconds)
pub const SERIAL_TIMEOUT_MS: u64 = 1000;

// =============================================================================
// Device model
// =============================================================================

/// Number of input channels on the switcher
pub const MAX_INPUTS: u8 = 40;

/// Number of output channels on the switcher
pub const MAX_OUTPUTS: u8 = 64;

/// Default number of channels shown and targeted by switch-to-all
pub const DEFAULT_CHANNEL_COUNT: u8 = 8;

/// Scene ids accepted by `SAVE`/`CALL`
pub const SCENE_ID_MIN: u8 = 1;
pub const SCENE_ID_MAX: u8 = 32;

// =============================================================================
// Splicing
// =============================================================================

/// Grid rows/cols bounds
pub const GRID_MIN: u8 = 1;
pub const GRID_MAX: u8 = 8;

/// Default splicing grid
pub const DEFAULT_GRID_ROWS: u8 = 4;
pub const DEFAULT_GRID_COLS: u8 = 5;

/// Hex header of the splice command
pub const SPLICE_HEADER: &str = "A5 5A 0B F0 00 0F";

/// Hex header of the unsplice command
pub const UNSPLICE_HEADER: &str = "A5 5A 0C F0 00 00";

/// Hex trailer shared by splice and unsplice
pub const SPLICE_TRAILER: &str = "00 AA";

// =============================================================================
// Logs
// =============================================================================

/// Default activity log capacity
pub const DEFAULT_LOG_CAPACITY: usize = 200;
