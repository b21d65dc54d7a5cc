//! Switcher command vocabulary
//!
//! Every action the switcher understands, rendered to the exact text that
//! goes on the wire. Literal commands are plain ASCII; splice commands are
//! hex byte pairs.

use super::{hex, Encoding};
use crate::constants::{SPLICE_HEADER, SPLICE_TRAILER, UNSPLICE_HEADER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Output resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "RES0")]
    Res0,
    #[serde(rename = "RES1")]
    Res1,
    #[serde(rename = "RES2")]
    Res2,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Res0, Resolution::Res1, Resolution::Res2];

    /// Wire token
    pub fn token(&self) -> &'static str {
        match self {
            Self::Res0 => "RES0",
            Self::Res1 => "RES1",
            Self::Res2 => "RES2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Res0 => "1920*1080p/60Hz",
            Self::Res1 => "3840*2160p/30Hz",
            Self::Res2 => "3840*2160p/60Hz",
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Accepts `0`, `1`, `2` or the wire tokens `RES0`..`RES2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_uppercase();
        let index = s.strip_prefix("RES").unwrap_or(&s);
        match index {
            "0" => Ok(Self::Res0),
            "1" => Ok(Self::Res1),
            "2" => Ok(Self::Res2),
            _ => Err(format!("unknown resolution '{}' (expected 0, 1 or 2)", s)),
        }
    }
}

/// A command for the switcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Route one input to a set of outputs: `3V1,2,5.`
    Switch { input: u8, outputs: BTreeSet<u8> },
    /// Route one input to every output: `3TOALL`
    SwitchAll { input: u8 },
    /// Store the current routing under a scene id: `SAVE7`
    SaveScene(u8),
    /// Recall a scene: `CALL7`
    CallScene(u8),
    Osd(bool),
    Buzzer(bool),
    Resolution(Resolution),
    /// Factory reset
    Reset,
    /// Merge the rectangle `start..=end` of a `cols` x `rows` grid
    Splice { start: u8, end: u8, cols: u8, rows: u8 },
    /// Cancel splicing over `start..=end`
    Unsplice { start: u8, end: u8, cols: u8, rows: u8 },
    /// Connectivity probe
    Test,
    /// User-entered command text, sent as-is
    Raw { text: String, encoding: Encoding },
}

impl Command {
    /// Build a switch command from any iterator of output ids
    pub fn switch(input: u8, outputs: impl IntoIterator<Item = u8>) -> Self {
        Self::Switch {
            input,
            outputs: outputs.into_iter().collect(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Splice { .. } | Self::Unsplice { .. } => Encoding::Hex,
            Self::Raw { encoding, .. } => *encoding,
            _ => Encoding::Text,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch { input, outputs } => {
                let outputs: Vec<String> = outputs.iter().map(|o| o.to_string()).collect();
                write!(f, "{}V{}.", input, outputs.join(","))
            }
            Self::SwitchAll { input } => write!(f, "{}TOALL", input),
            Self::SaveScene(id) => write!(f, "SAVE{}", id),
            Self::CallScene(id) => write!(f, "CALL{}", id),
            Self::Osd(on) => f.write_str(if *on { "OSDON" } else { "OSDOFF" }),
            Self::Buzzer(on) => f.write_str(if *on { "BUZON" } else { "BUZOFF" }),
            Self::Resolution(res) => f.write_str(res.token()),
            Self::Reset => f.write_str("RESET"),
            Self::Splice {
                start,
                end,
                cols,
                rows,
            } => write_splice(f, SPLICE_HEADER, [*start, *end, *cols, *rows]),
            Self::Unsplice {
                start,
                end,
                cols,
                rows,
            } => write_splice(f, UNSPLICE_HEADER, [*start, *end, *cols, *rows]),
            Self::Test => f.write_str("TEST"),
            Self::Raw { text, .. } => f.write_str(text),
        }
    }
}

fn write_splice(f: &mut fmt::Formatter<'_>, header: &str, params: [u8; 4]) -> fmt::Result {
    write!(f, "{} {} {}", header, hex::encode(&params), SPLICE_TRAILER)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_sorts_outputs() {
        let cmd = Command::switch(3, [5, 1, 2]);
        assert_eq!(cmd.to_string(), "3V1,2,5.");
        assert_eq!(cmd.encoding(), Encoding::Text);
    }

    #[test]
    fn test_switch_deduplicates_outputs() {
        assert_eq!(Command::switch(1, [4, 4, 2]).to_string(), "1V2,4.");
    }

    #[test]
    fn test_literal_tokens() {
        assert_eq!(Command::SwitchAll { input: 12 }.to_string(), "12TOALL");
        assert_eq!(Command::SaveScene(7).to_string(), "SAVE7");
        assert_eq!(Command::CallScene(32).to_string(), "CALL32");
        assert_eq!(Command::Osd(true).to_string(), "OSDON");
        assert_eq!(Command::Osd(false).to_string(), "OSDOFF");
        assert_eq!(Command::Buzzer(true).to_string(), "BUZON");
        assert_eq!(Command::Buzzer(false).to_string(), "BUZOFF");
        assert_eq!(Command::Reset.to_string(), "RESET");
        assert_eq!(Command::Resolution(Resolution::Res2).to_string(), "RES2");
        assert_eq!(Command::Test.to_string(), "TEST");
    }

    #[test]
    fn test_splice_hex_layout() {
        let cmd = Command::Splice {
            start: 1,
            end: 10,
            cols: 5,
            rows: 4,
        };
        assert_eq!(cmd.to_string(), "A5 5A 0B F0 00 0F 01 0A 05 04 00 AA");
        assert_eq!(cmd.encoding(), Encoding::Hex);
    }

    #[test]
    fn test_unsplice_hex_layout() {
        let cmd = Command::Unsplice {
            start: 1,
            end: 64,
            cols: 8,
            rows: 8,
        };
        assert_eq!(cmd.to_string(), "A5 5A 0C F0 00 00 01 40 08 08 00 AA");
    }

    #[test]
    fn test_splice_command_decodes() {
        let cmd = Command::Splice {
            start: 6,
            end: 12,
            cols: 5,
            rows: 4,
        };
        let bytes = hex::decode(&cmd.to_string()).unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[6..10], &[6, 12, 5, 4]);
    }

    #[test]
    fn test_raw_keeps_encoding() {
        let cmd = Command::Raw {
            text: "01 02".into(),
            encoding: Encoding::Hex,
        };
        assert_eq!(cmd.encoding(), Encoding::Hex);
        assert_eq!(cmd.to_string(), "01 02");
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1".parse::<Resolution>().unwrap(), Resolution::Res1);
        assert_eq!("res2".parse::<Resolution>().unwrap(), Resolution::Res2);
        assert_eq!("RES0".parse::<Resolution>().unwrap(), Resolution::Res0);
        assert!("3".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_json_token() {
        let json = serde_json::to_string(&Resolution::Res1).unwrap();
        assert_eq!(json, "\"RES1\"");
    }
}
