//! Activity log entry types

use crate::transport::TransportKind;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogKind {
    /// Command delivered to the transport
    Sent {
        transport: TransportKind,
        command: String,
        bytes: usize,
    },
    /// Command rejected or failed during I/O
    Failed {
        transport: TransportKind,
        command: String,
        reason: String,
    },
    /// Connection state change or other notice
    System { message: String },
}

/// One line of the activity log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String, // HH:MM:SS.mmm
    pub kind: LogKind,
}

impl LogEntry {
    /// Current timestamp as HH:MM:SS.mmm
    #[inline]
    fn now() -> String {
        chrono::Local::now().format("%H:%M:%S%.3f").to_string()
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self {
            timestamp: Self::now(),
            kind: LogKind::System {
                message: message.into(),
            },
        }
    }

    pub fn sent(transport: TransportKind, command: impl Into<String>, bytes: usize) -> Self {
        Self {
            timestamp: Self::now(),
            kind: LogKind::Sent {
                transport,
                command: command.into(),
                bytes,
            },
        }
    }

    pub fn failed(
        transport: TransportKind,
        command: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Self::now(),
            kind: LogKind::Failed {
                transport,
                command: command.into(),
                reason: reason.into(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.kind, LogKind::Failed { .. })
    }

    /// Plain text rendering
    pub fn to_line(&self) -> String {
        match &self.kind {
            LogKind::Sent {
                transport,
                command,
                bytes,
            } => format!("{} → [{}] {} ({} B)", self.timestamp, transport, command, bytes),
            LogKind::Failed {
                transport,
                command,
                reason,
            } => format!("{} ✗ [{}] {}: {}", self.timestamp, transport, command, reason),
            LogKind::System { message } => format!("{} [SYS] {}", self.timestamp, message),
        }
    }
}
