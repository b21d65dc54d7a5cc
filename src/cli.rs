//! Command-line interface definition using clap
//!
//! The same [`Action`] verbs are accepted as one-shot subcommands and as
//! lines typed into the interactive shell.

use crate::codec::Resolution;
use crate::transport::TransportKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Control a video matrix switcher over UDP, TCP or serial
#[derive(Parser, Debug)]
#[command(name = "mxl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Without a subcommand the interactive shell starts
    #[command(subcommand)]
    pub command: Option<TopCommand>,
}

#[derive(Subcommand, Debug)]
pub enum TopCommand {
    #[command(flatten)]
    Action(Action),

    /// Interactive shell keeping the serial port open between commands
    Shell,
}

/// On/off switch for hardware toggles
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    Input,
    Output,
}

/// Operations shared by one-shot mode and the shell
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send raw command text (`3V1,2.`) or hex bytes with --hex
    Send {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        command: Vec<String>,
        /// Treat the command as whitespace-separated hex byte pairs
        #[arg(long)]
        hex: bool,
    },

    /// Route an input to one or more outputs
    Switch {
        input: u8,
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        outputs: Vec<u8>,
    },

    /// Route an input to every shown output
    SwitchAll { input: u8 },

    /// Save, recall and manage scenes
    Scene {
        #[command(subcommand)]
        action: SceneAction,
    },

    /// Merge screens of the splicing grid into one
    Splice {
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        tiles: Vec<u8>,
    },

    /// Cancel every spliced group
    Unsplice,

    /// Set the splicing grid (clears groups)
    Layout { rows: u8, cols: u8 },

    /// Show or hide the on-screen display
    Osd {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Enable or disable the key buzzer
    Buzzer {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Output resolution: 0 (1080p60), 1 (2160p30), 2 (2160p60)
    Resolution { value: Resolution },

    /// Factory reset the switcher
    Reset,

    /// Power relay commands
    Power {
        #[command(subcommand)]
        action: PowerAction,
    },

    /// Show or edit connection settings
    Connection {
        #[command(subcommand)]
        action: ConnectionAction,
    },

    /// List serial ports
    Ports,

    /// Send the TEST probe over the active transport
    Test,

    /// Rename an input or output channel (empty label restores the default)
    Label {
        #[arg(value_enum)]
        side: ChannelSide,
        id: u8,
        #[arg(num_args = 0..)]
        label: Vec<String>,
    },

    /// Number of outputs shown and targeted by switch-all
    Channels { count: u8 },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SceneAction {
    /// Save the switch history as a scene (shell only keeps a history)
    Save {
        /// Scene id, 1-32 (default: lowest free id)
        #[arg(long)]
        id: Option<u8>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Recall a scene
    Call { id: u8 },
    /// Rename a scene
    Rename {
        id: u8,
        #[arg(num_args = 0..)]
        name: Vec<String>,
    },
    /// Delete a scene
    Delete { id: u8 },
    /// Delete every scene
    DeleteAll,
    /// List scenes
    List,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PowerAction {
    On,
    Off,
    /// Store the hex commands sent by `power on` / `power off`
    Set {
        #[arg(long, default_value = "")]
        on: String,
        #[arg(long, default_value = "")]
        off: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Print current settings
    Show,
    /// Change transport and addressing
    Set {
        /// serial, tcp or udp
        #[arg(long)]
        transport: Option<TransportKind>,
        /// Address of the active network transport
        #[arg(long)]
        ip: Option<String>,
        /// Port of the active network transport
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        udp_ip: Option<String>,
        #[arg(long)]
        udp_port: Option<u16>,
        #[arg(long)]
        tcp_ip: Option<String>,
        #[arg(long)]
        tcp_port: Option<u16>,
        #[arg(long)]
        serial_port: Option<String>,
    },
    /// Edit one octet (0-3) of the active address
    Segment { index: usize, value: String },
}

// =============================================================================
// Shell grammar
// =============================================================================

/// One line typed into the shell
#[derive(Parser, Debug)]
#[command(name = "mxl>", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(flatten)]
    Action(Action),

    /// Open a serial port (default: the configured one)
    Connect { port: Option<String> },
    /// Close the serial port
    Disconnect,
    /// Show connection and serial state
    Status,
    /// Show recent activity
    Log {
        #[arg(default_value_t = 20)]
        count: usize,
    },
    /// Show pending switches
    History,
    /// Forget pending switches
    ClearHistory,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Split a shell line into words, honoring double quotes
pub fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_word = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if has_word {
        words.push(current);
    }
    words
}

// =============================================================================
// Tests
// =============================================================================
