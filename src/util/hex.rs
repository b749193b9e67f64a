//! # Hex Helpers
//!
//! Telegrams arrive as hex strings, usually copied from a receiver log with
//! spaces, colons or a `0x` prefix mixed in.
//!
//! ```rust
//! use wmbus_dv::util::hex::{decode_hex, format_hex_compact};
//!
//! let bytes = decode_hex("03 06 2C 00 00").unwrap();
//! assert_eq!(format_hex_compact(&bytes), "03 06 2C 00 00");
//! ```

use crate::error::DvError;

/// Decodes a hex string, ignoring whitespace, `:`/`-`/`_` separators and a
/// leading `0x`.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DvError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ':' | '-' | '_'))
        .collect();

    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return Err(DvError::InvalidHexString);
    }
    hex::decode(&cleaned).map_err(|_| DvError::InvalidHexString)
}

/// Uppercase hex without separators, the form used for record keys.
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Formats data as "03 06 2C" for logs.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Test helper; panics on invalid hex.
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    decode_hex(hex).expect("Invalid hex in test data")
}
