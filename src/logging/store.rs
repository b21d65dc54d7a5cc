//! Activity log storage
//!
//! Pure data structure for managing log entries with no I/O side effects.

use super::LogEntry;
use std::collections::VecDeque;

/// Bounded activity log
///
/// Ring buffer (`VecDeque`): the oldest entry is dropped once capacity is
/// reached.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl ActivityLog {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Add a log entry, rotating out old entries if at capacity
    pub fn add(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    // === Export (pure methods) ===

    /// Format all logs as text
    pub fn to_text(&self) -> String {
        self.to_text_limited(self.entries.len())
    }

    /// Format the `max` most recent logs as text
    pub fn to_text_limited(&self, max: usize) -> String {
        let start = self.entries.len().saturating_sub(max);
        self.entries
            .iter()
            .skip(start)
            .map(LogEntry::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogKind;
    use crate::transport::TransportKind;

    fn make_system_log(msg: &str) -> LogEntry {
        let mut entry = LogEntry::system(msg);
        entry.timestamp = "00:00:00.000".into();
        entry
    }

    #[test]
    fn test_add_rotates_when_full() {
        let mut log = ActivityLog::new(3);
        for i in 0..5 {
            log.add(make_system_log(&format!("msg{}", i)));
        }

        assert_eq!(log.len(), 3);
        let first = &log.entries()[0];
        assert_eq!(
            first.kind,
            LogKind::System {
                message: "msg2".into()
            }
        );
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let mut log = ActivityLog::new(0);
        log.add(make_system_log("a"));
        log.add(make_system_log("b"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_to_text_limited() {
        let mut log = ActivityLog::new(10);
        log.add(make_system_log("one"));
        log.add(make_system_log("two"));
        log.add(LogEntry::sent(TransportKind::Tcp, "OSDON", 5));

        let text = log.to_text_limited(2);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("00:00:00.000 [SYS] two"));
        assert!(text.ends_with("OSDON (5 B)"));

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.to_text(), "");
    }
}
