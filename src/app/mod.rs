//! Application state and orchestration
//!
//! `App` ties the persisted [`Store`], the [`CommandSender`] and the
//! in-memory switch history together. Every user operation lives here,
//! split by page:
//! - `connection`: transport selection, addressing, serial lifecycle
//! - `switching`: input to output routing
//! - `scenes`: save/recall of routing snapshots
//! - `splicing`: grid layout and tile groups
//! - `hardware`: OSD, buzzer, resolution, power, channel labels
//!
//! Every send outcome lands in the activity log.

mod connection;
mod hardware;
mod scenes;
mod splicing;
mod switching;

use crate::codec::{Command, Encoding};
use crate::error::Result;
use crate::logging::{ActivityLog, LogEntry};
use crate::sender::{CommandSender, Delivery};
use crate::state::{AppState, ConnectionRegistry, ConnectionSettings, Store, SwitchHistory};
use tracing::info;

/// Main application
pub struct App {
    store: Store,
    sender: CommandSender,
    history: SwitchHistory,
    logs: ActivityLog,
}

impl App {
    /// Build the app and reconcile the cached serial flag with the live link
    pub fn new(store: Store, sender: CommandSender, max_log_entries: usize) -> Self {
        let mut app = Self {
            store,
            sender,
            history: SwitchHistory::new(),
            logs: ActivityLog::new(max_log_entries),
        };
        app.reconcile_serial();
        app
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn connection(&self) -> ConnectionSettings {
        self.store.get()
    }

    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    pub fn history(&self) -> &SwitchHistory {
        &self.history
    }

    pub fn logs(&self) -> &ActivityLog {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub(crate) fn log_system(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.logs.add(LogEntry::system(message));
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send user-entered command text as-is
    pub async fn send_raw(&mut self, text: &str, encoding: Encoding) -> Result<Delivery> {
        let transport = self.store.get().active_type;
        match self.sender.send(&mut self.store, text, encoding).await {
            Ok(delivery) => {
                self.logs
                    .add(LogEntry::sent(delivery.transport, text, delivery.bytes));
                Ok(delivery)
            }
            Err(e) => {
                self.logs
                    .add(LogEntry::failed(transport, text, e.to_string()));
                Err(e)
            }
        }
    }

    /// Render and send a switcher command
    pub async fn dispatch(&mut self, command: &Command) -> Result<Delivery> {
        self.send_raw(&command.to_string(), command.encoding()).await
    }
}
