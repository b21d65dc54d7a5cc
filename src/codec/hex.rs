//! Hex command text
//!
//! Hex commands are written as whitespace-delimited byte pairs
//! (`A5 5A 0B F0 00 0F 01 0A 00 AA`). Whitespace anywhere in the text is
//! ignored; what remains must be an even number of hex digits.

use crate::error::{MatrixError, Result};

/// Decode hex command text into bytes
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let invalid = || MatrixError::HexDecode {
        input: input.to_string(),
    };

    if digits.len() % 2 != 0 {
        return Err(invalid());
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(invalid()),
        })
        .collect()
}

/// Encode bytes as uppercase, space-separated byte pairs
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| byte(*b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A single byte as two uppercase hex digits
#[inline]
pub fn byte(value: u8) -> String {
    format!("{:02X}", value)
}

/// Check that text is a decodable, non-empty hex command
pub fn validate(input: &str) -> Result<()> {
    let bytes = decode(input)?;
    if bytes.is_empty() {
        return Err(MatrixError::HexDecode {
            input: input.to_string(),
        });
    }
    Ok(())
}

#[inline]
fn nibble(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|d| d as u8)
}

// ============================================================================
// Tests
// ============================================================================
