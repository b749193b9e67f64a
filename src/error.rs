//! # DV Error Handling
//!
//! This module defines the DvError enum, which represents the different error
//! types that can occur while scanning and decoding telegram data records.

use crate::units::{Quantity, Unit};
use thiserror::Error;

/// Represents the different error types that can occur in the wmbus-dv crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DvError {
    /// More DIFE bytes were chained than the standard allows.
    #[error("Malformed DIF chain at offset {offset}: too many DIFE bytes")]
    MalformedDifChain { offset: usize },

    /// More VIFE bytes were chained than the standard allows.
    #[error("Malformed VIF chain at offset {offset}: too many VIFE bytes")]
    MalformedVifChain { offset: usize },

    /// A header or payload runs past the end of the telegram.
    #[error("Payload truncated at offset {offset}: needed {needed} bytes, {available} available")]
    PayloadTruncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A BCD nibble outside 0-9 was found.
    #[error("Invalid BCD digit in byte 0x{byte:02X} at offset {offset}")]
    InvalidBcdDigit { offset: usize, byte: u8 },

    /// The DIF/VIF combination is not implemented by the decoder.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// A packed date does not describe a calendar date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A unit was used with a quantity it does not belong to.
    #[error("Unit {unit:?} does not belong to quantity {expected:?}")]
    QuantityMismatch { unit: Unit, expected: Quantity },

    /// No record matched the requested key or selector.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// No meter driver is registered under this name.
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    /// A unit name could not be parsed.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// Meter configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DvError {
    /// Returns true for errors that describe a field simply being absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DvError::KeyNotFound(_))
    }
}
