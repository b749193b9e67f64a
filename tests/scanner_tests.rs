//! Integration tests for record scanning and key lookup.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashMap;
use wmbus_dv::payload::data_encoding::{encode_bcd, encode_date_g};
use wmbus_dv::util::hex::{encode_hex_upper, hex_to_bytes};
use wmbus_dv::{find_key, scan, DataEncoding, DvError, MeasurementType, Telegram, ValueInformation};

const SHARKY: &str = "03062C0000 4306000000 0314630000 426C7F2A 022D1300 01FF2100";

#[test]
fn test_scan_sharky_telegram_keys_in_order() {
    let records = scan(&hex_to_bytes(SHARKY), 0).unwrap();
    let keys: Vec<&str> = records.keys().collect();
    assert_eq!(keys, vec!["0306", "4306", "0314", "426C", "022D", "01FF21"]);
}

#[test]
fn test_scan_record_fields() {
    let records = scan(&hex_to_bytes(SHARKY), 0).unwrap();

    let energy = records.get("4306").unwrap();
    assert_eq!(energy.measurement_type, MeasurementType::Instantaneous);
    assert_eq!(energy.value_information, ValueInformation::EnergyWh);
    assert_eq!(energy.storage_number, 1);
    assert_eq!(energy.tariff, 0);
    assert_eq!(energy.data_encoding, DataEncoding::Int { bytes: 3 });
    assert_eq!(energy.offset, 5);
    assert_eq!((energy.byte_span.offset, energy.byte_span.len), (7, 3));

    let date = records.get("426C").unwrap();
    assert_eq!(date.data_encoding, DataEncoding::DateG);
    assert_eq!(date.storage_number, 1);
}

#[test]
fn test_spans_stay_inside_telegram() {
    let bytes = hex_to_bytes(SHARKY);
    let records = scan(&bytes, 0).unwrap();
    for record in records.iter() {
        assert!(record.byte_span.end() <= bytes.len(), "{}", record.key);
    }
}

#[test]
fn test_scan_is_idempotent() {
    let bytes = hex_to_bytes(SHARKY);
    assert_eq!(scan(&bytes, 0).unwrap(), scan(&bytes, 0).unwrap());
}

#[test]
fn test_scan_from_offset() {
    let mut bytes = vec![0xAA, 0xBB, 0xCC];
    bytes.extend(hex_to_bytes("022D1300"));
    let records = scan(&bytes, 3).unwrap();
    let power = records.get("022D").unwrap();
    assert_eq!(power.offset, 3);
    assert_eq!(power.byte_span.offset, 5);
}

#[test]
fn test_repeated_header_gets_suffix() {
    let records = scan(&hex_to_bytes("0306010000 0306020000 0306030000"), 0).unwrap();
    let keys: Vec<&str> = records.keys().collect();
    assert_eq!(keys, vec!["0306", "0306_2", "0306_3"]);
}

#[test]
fn test_eight_byte_payload_truncated() {
    // 64-bit integer energy with only three payload bytes left.
    let err = scan(&hex_to_bytes("0706 010203"), 0).unwrap_err();
    assert_eq!(
        err,
        DvError::PayloadTruncated {
            offset: 2,
            needed: 8,
            available: 3
        }
    );
}

#[test]
fn test_fillers_are_skipped() {
    let records = scan(&hex_to_bytes("2F 2F 022D1300 2F"), 0).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records.contains_key("022D"));
}

#[test]
fn test_manufacturer_data_ends_scan() {
    let records = scan(&hex_to_bytes("022D1300 0F 010203"), 0).unwrap();
    let keys: Vec<&str> = records.keys().collect();
    assert_eq!(keys, vec!["022D", "0F"]);
    assert_eq!(records.get("0F").unwrap().byte_span.len, 3);
}

#[test]
fn test_encoded_records_scan_back() {
    let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
    let mut bytes = vec![0x0C, 0x13];
    bytes.extend(encode_bcd(12_345_678, 4));
    bytes.extend([0x42, 0x6C]);
    bytes.extend(encode_date_g(date));

    let mut telegram = Telegram::parse(bytes).unwrap();
    let (_, volume) = telegram.extract_double("0C13").unwrap();
    assert!((volume - 12_345.678).abs() < 1e-6);
    let (_, decoded) = telegram.extract_date("426C").unwrap();
    assert_eq!(decoded, Some(date));

    telegram.add_more_explanation(2, " volume");
    assert!(telegram.analyse().contains("volume"));
}

#[test]
fn test_find_key_by_selector() {
    let records = scan(&hex_to_bytes(SHARKY), 0).unwrap();
    assert_eq!(
        find_key(MeasurementType::Instantaneous, ValueInformation::Volume, 0, 0, &records),
        Some("0314")
    );
    assert_eq!(
        find_key(MeasurementType::Unknown, ValueInformation::Date, 1, 0, &records),
        Some("426C")
    );
    assert_eq!(
        find_key(MeasurementType::Instantaneous, ValueInformation::Date, 0, 0, &records),
        None
    );
}

#[test]
fn test_storage_overflowing_32_bits_is_malformed() {
    let mut bytes = vec![0x81];
    bytes.extend([0x81; 8]);
    bytes.extend([0x01, 0x13, 0x05]);
    assert_eq!(scan(&bytes, 0).unwrap_err(), DvError::MalformedDifChain { offset: 9 });
}

#[test]
fn test_lvar_negative_bcd_is_not_negated_twice() {
    let t = Telegram::parse(hex_to_bytes("0D13D105")).unwrap();
    let (_, volume) = t.extract_double("0D13").unwrap();
    assert!((volume + 0.005).abs() < 1e-12);

    let t = Telegram::parse(hex_to_bytes("0D13D1F5")).unwrap();
    assert_eq!(
        t.extract_double("0D13").unwrap_err(),
        DvError::InvalidBcdDigit { offset: 3, byte: 0xF5 }
    );
}

/// One record as a meter would send it.
#[derive(Debug, Clone)]
struct PlannedRecord {
    /// DIF data field: 1..=4 integer bytes, 0x9..=0xC BCD.
    data_field: u8,
    /// VIF and the exponent it implies.
    vif: (u8, i32),
    dife_count: usize,
    storage_number: u32,
    tariff: u32,
    raw: u64,
}

impl PlannedRecord {
    fn payload_len(&self) -> usize {
        match self.data_field {
            0x1..=0x4 => usize::from(self.data_field),
            _ => usize::from(self.data_field - 0x8),
        }
    }

    fn header(&self) -> Vec<u8> {
        let extended = if self.dife_count > 0 { 0x80 } else { 0x00 };
        let storage_bit = ((self.storage_number & 1) as u8) << 6;
        let mut header = vec![extended | storage_bit | self.data_field];
        for i in 0..self.dife_count {
            let storage = ((u64::from(self.storage_number) >> (1 + 4 * i)) & 0x0F) as u8;
            let tariff = ((self.tariff >> (2 * i)) & 0x03) as u8;
            let more = if i + 1 < self.dife_count { 0x80 } else { 0x00 };
            header.push(more | (tariff << 4) | storage);
        }
        header.push(self.vif.0);
        header
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend(self.header());
        match self.data_field {
            0x1..=0x4 => out.extend(&self.raw.to_le_bytes()[..self.payload_len()]),
            _ => out.extend(encode_bcd(self.raw, self.payload_len())),
        }
    }
}

fn planned_record() -> impl Strategy<Value = PlannedRecord> {
    (
        prop::sample::select(vec![0x1u8, 0x2, 0x3, 0x4, 0x9, 0xA, 0xB, 0xC]),
        // Energy kWh, volume 10^-3 m3, power 10^-3 kW.
        prop::sample::select(vec![(0x06u8, 0i32), (0x13, -3), (0x2B, -3)]),
        0usize..=10,
        any::<u32>(),
        any::<u32>(),
        any::<u64>(),
    )
        .prop_map(|(data_field, vif, dife_count, storage, tariff, raw)| {
            let storage_bits = (1 + 4 * dife_count).min(32);
            let storage_number = if storage_bits == 32 {
                storage
            } else {
                storage & ((1u32 << storage_bits) - 1)
            };
            let tariff = tariff & ((1u32 << (2 * dife_count)) - 1);
            let mut record = PlannedRecord {
                data_field,
                vif,
                dife_count,
                storage_number,
                tariff,
                raw: 0,
            };
            // Keep integers positive and BCD within its digit count.
            let len = record.payload_len() as u32;
            record.raw = match data_field {
                0x1..=0x4 => raw % (1u64 << (8 * len - 1)),
                _ => raw % 10u64.pow(2 * len),
            };
            record
        })
}

proptest! {
    #[test]
    fn prop_encoded_records_scan_back(planned in prop::collection::vec(planned_record(), 1..8)) {
        let mut bytes = Vec::new();
        for record in &planned {
            record.encode(&mut bytes);
        }
        let telegram = Telegram::parse(bytes).unwrap();
        let records: Vec<_> = telegram.records().iter().collect();
        prop_assert_eq!(records.len(), planned.len());

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (record, plan) in records.iter().zip(&planned) {
            let base = encode_hex_upper(&plan.header());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let expected_key = if *count == 1 { base } else { format!("{base}_{count}") };
            prop_assert_eq!(&record.key, &expected_key);

            prop_assert_eq!(record.storage_number, plan.storage_number);
            prop_assert_eq!(record.tariff, plan.tariff);
            let expected_encoding = match plan.data_field {
                0x1..=0x4 => DataEncoding::Int { bytes: plan.data_field },
                d => DataEncoding::Bcd { digits: (d - 0x8) * 2, negative: false },
            };
            prop_assert_eq!(record.data_encoding, expected_encoding);

            let (_, value) = telegram.extract_double(&record.key).unwrap();
            let expected = plan.raw as f64 * 10f64.powi(plan.vif.1);
            prop_assert!((value - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
    }
}
