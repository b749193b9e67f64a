//! # Utility Modules
//!
//! Hex helpers shared by the command line tool, tests and benches.

pub mod hex;

pub use hex::{decode_hex, encode_hex_upper, format_hex_compact, hex_to_bytes};
