//! Command encoding
//!
//! Separates what is sent from how it travels:
//! - **Codec**: command vocabulary and text-to-bytes encoding
//! - **Transport**: how bytes reach the switcher (UDP, TCP, Serial)
//!
//! Only two encodings exist. Literal text goes out as its UTF-8 bytes;
//! hex text is decoded pair by pair.

pub mod command;
pub mod hex;

pub use command::{Command, Resolution};

use crate::error::Result;
use bytes::Bytes;
use std::fmt;

/// How command text becomes payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Literal text, sent as UTF-8
    #[default]
    Text,
    /// Whitespace-delimited hex byte pairs
    Hex,
}

impl Encoding {
    pub fn from_hex_flag(is_hex: bool) -> Self {
        if is_hex {
            Self::Hex
        } else {
            Self::Text
        }
    }

    pub fn is_hex(&self) -> bool {
        matches!(self, Self::Hex)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Hex => "hex",
        })
    }
}

/// Encode command text into the payload written to the transport
pub fn encode(command: &str, encoding: Encoding) -> Result<Bytes> {
    match encoding {
        Encoding::Text => Ok(Bytes::copy_from_slice(command.as_bytes())),
        Encoding::Hex => hex::decode(command).map(Bytes::from),
    }
}
