//! matrix-link: command transport for video matrix switchers
//!
//! Sends switching, scene, splicing and hardware commands to a matrix
//! switcher over UDP, TCP or a serial port, and keeps the persisted
//! connection settings, scenes and splicing groups that drive them.

pub mod app;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod instance_lock;
pub mod logging;
pub mod sender;
pub mod shell;
pub mod state;
pub mod transport;

pub use app::App;
pub use error::{MatrixError, Result};
pub use sender::{CommandSender, Delivery, SenderOptions};
