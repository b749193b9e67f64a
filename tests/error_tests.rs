//! Unit tests for the `DvError` enum and its `Display` implementation.

use wmbus_dv::error::DvError;
use wmbus_dv::units::{Quantity, Unit};

/// Tests that the `PayloadTruncated` variant is correctly formatted.
#[test]
fn test_payload_truncated_error() {
    let err = DvError::PayloadTruncated {
        offset: 2,
        needed: 8,
        available: 3,
    };
    assert_eq!(
        err.to_string(),
        "Payload truncated at offset 2: needed 8 bytes, 3 available"
    );
}

/// Tests that the `InvalidBcdDigit` variant is correctly formatted.
#[test]
fn test_invalid_bcd_error() {
    let err = DvError::InvalidBcdDigit { offset: 4, byte: 0xAB };
    assert_eq!(err.to_string(), "Invalid BCD digit in byte 0xAB at offset 4");
}

/// Tests that the `QuantityMismatch` variant is correctly formatted.
#[test]
fn test_quantity_mismatch_error() {
    let err = DvError::QuantityMismatch {
        unit: Unit::Kwh,
        expected: Quantity::Volume,
    };
    assert_eq!(err.to_string(), "Unit Kwh does not belong to quantity Volume");
}

/// Tests that the `KeyNotFound` variant is correctly formatted.
#[test]
fn test_key_not_found_error() {
    let err = DvError::KeyNotFound("0306".to_string());
    assert_eq!(err.to_string(), "Key not found: 0306");
    assert!(err.is_not_found());
}

/// Tests that the `UnknownDriver` variant is correctly formatted.
#[test]
fn test_unknown_driver_error() {
    let err = DvError::UnknownDriver("multical21".to_string());
    assert_eq!(err.to_string(), "Unknown driver: multical21");
    assert!(!err.is_not_found());
}

/// Tests that the `InvalidHexString` variant is correctly formatted.
#[test]
fn test_invalid_hex_string_error() {
    assert_eq!(DvError::InvalidHexString.to_string(), "Invalid hexadecimal string");
}

/// Tests that the chain length variants are correctly formatted.
#[test]
fn test_chain_errors() {
    assert_eq!(
        DvError::MalformedDifChain { offset: 0 }.to_string(),
        "Malformed DIF chain at offset 0: too many DIFE bytes"
    );
    assert_eq!(
        DvError::MalformedVifChain { offset: 1 }.to_string(),
        "Malformed VIF chain at offset 1: too many VIFE bytes"
    );
}
