//! DV record scanning.
//!
//! [`scan`] walks the data record area of a telegram once, front to back,
//! and produces one [`RecordDescriptor`] per DIF/VIF group. Any failure
//! aborts the whole scan.

use crate::constants::*;
use crate::error::DvError;
use crate::payload::cursor::DvCursor;
use crate::payload::data_encoding::{decode_value, DvValue};
use crate::payload::dif::{parse_dib, DataEncoding, MeasurementType};
use crate::payload::vif::{parse_vib, ValueInformation, VifeModifier};
use crate::units::Unit;
use crate::util::hex::encode_hex_upper;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// A diagnostic note attached to a byte offset of a telegram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub offset: usize,
    pub text: String,
    /// Set once a driver has interpreted the bytes at this offset.
    pub understood: bool,
}

impl Explanation {
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
            understood: false,
        }
    }
}

/// Location of a payload within the telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteSpan {
    pub offset: usize,
    pub len: usize,
}

impl ByteSpan {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// One decoded DIF/VIF group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDescriptor {
    pub key: String,
    pub measurement_type: MeasurementType,
    pub value_information: ValueInformation,
    /// Raw VIF code; extension table codes carry their table offset.
    pub vif: u16,
    pub storage_number: u32,
    pub tariff: u32,
    pub subunit: u32,
    pub data_encoding: DataEncoding,
    pub unit: Option<Unit>,
    pub exponent: i32,
    pub modifiers: Vec<VifeModifier>,
    pub plain_text_unit: Option<String>,
    /// Offset of the DIF byte.
    pub offset: usize,
    pub byte_span: ByteSpan,
}

impl RecordDescriptor {
    pub fn is_negated(&self) -> bool {
        self.modifiers.contains(&VifeModifier::Negated)
    }

    /// The payload bytes of this record within `telegram`.
    pub fn payload<'a>(&self, telegram: &'a [u8]) -> Result<&'a [u8], DvError> {
        telegram
            .get(self.byte_span.offset..self.byte_span.end())
            .ok_or(DvError::PayloadTruncated {
                offset: self.byte_span.offset,
                needed: self.byte_span.len,
                available: telegram.len().saturating_sub(self.byte_span.offset),
            })
    }

    /// Decodes the payload of this record within `telegram`.
    pub fn decode(&self, telegram: &[u8]) -> Result<DvValue, DvError> {
        decode_value(self.data_encoding, self.payload(telegram)?, self.byte_span.offset)
    }
}

/// Records of one telegram, in byte order, indexed by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DvRecords {
    records: Vec<RecordDescriptor>,
    index: HashMap<String, usize>,
    notes: Vec<Explanation>,
}

impl DvRecords {
    pub fn get(&self, key: &str) -> Option<&RecordDescriptor> {
        self.index.get(key).map(|i| &self.records[*i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordDescriptor> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Annotations produced while scanning, in byte order.
    pub fn notes(&self) -> &[Explanation] {
        &self.notes
    }

    pub(crate) fn take_notes(&mut self) -> Vec<Explanation> {
        std::mem::take(&mut self.notes)
    }

    fn push(&mut self, mut record: RecordDescriptor) {
        let base = record.key.clone();
        let mut n = 1;
        while self.index.contains_key(&record.key) {
            n += 1;
            record.key = format!("{base}_{n}");
        }
        self.index.insert(record.key.clone(), self.records.len());
        self.records.push(record);
    }
}

fn hex_key(bytes: &[u8]) -> String {
    encode_hex_upper(bytes)
}

/// Scans the data records of `telegram` starting at byte `start`.
pub fn scan(telegram: &[u8], start: usize) -> Result<DvRecords, DvError> {
    let mut cursor = DvCursor::new(telegram, start)?;
    let mut records = DvRecords::default();
    let mut notes = Vec::new();

    while let Some(dif) = cursor.peek() {
        let offset = cursor.offset();
        cursor.next_byte()?;

        match dif {
            MBUS_DIB_DIF_IDLE_FILLER => {
                notes.push(Explanation::new(offset, format!("{dif:02X} skip")));
                continue;
            }
            MBUS_DIB_DIF_GLOBAL_READOUT => {
                notes.push(Explanation::new(offset, format!("{dif:02X} global readout")));
                continue;
            }
            MBUS_DIB_DIF_MANUFACTURER_SPECIFIC | MBUS_DIB_DIF_MORE_RECORDS_FOLLOW => {
                let data_offset = cursor.offset();
                let data = cursor.take_rest();
                notes.push(Explanation::new(offset, format!("{dif:02X} manufacturer specific data")));
                if !data.is_empty() {
                    notes.push(Explanation::new(data_offset, hex_key(data)));
                }
                records.push(RecordDescriptor {
                    key: hex_key(&[dif]),
                    measurement_type: MeasurementType::Unknown,
                    value_information: ValueInformation::ManufacturerSpecific,
                    vif: 0,
                    storage_number: 0,
                    tariff: 0,
                    subunit: 0,
                    data_encoding: DataEncoding::ManufacturerData,
                    unit: None,
                    exponent: 0,
                    modifiers: Vec::new(),
                    plain_text_unit: None,
                    offset,
                    byte_span: ByteSpan {
                        offset: data_offset,
                        len: data.len(),
                    },
                });
                break;
            }
            _ => {}
        }

        let dib = parse_dib(&mut cursor, dif, offset, &mut notes)?;
        let vib = parse_vib(&mut cursor, &mut notes)?;

        let data_encoding = match dib.encoding {
            Some(encoding) => refine_encoding(encoding, vib.info.value_information),
            None => {
                let at = cursor.offset();
                let len = cursor.next_byte()?;
                let encoding = DataEncoding::from_lvar(len)?;
                notes.push(Explanation::new(at, format!("{len:02X} lvar ({})", encoding.description())));
                encoding
            }
        };

        let payload_offset = cursor.offset();
        let payload = cursor.take(data_encoding.len())?;
        if !payload.is_empty() {
            notes.push(Explanation::new(payload_offset, hex_key(payload)));
        }

        let mut header = dib.bytes();
        header.extend_from_slice(&vib.bytes);

        let record = RecordDescriptor {
            key: hex_key(&header),
            measurement_type: dib.measurement_type,
            value_information: vib.info.value_information,
            vif: vib.info.vif,
            storage_number: dib.storage_number,
            tariff: dib.tariff,
            subunit: dib.subunit,
            data_encoding,
            unit: vib.unit(),
            exponent: vib.exponent(),
            plain_text_unit: vib.plain_text_unit,
            modifiers: vib.modifiers,
            offset,
            byte_span: ByteSpan {
                offset: payload_offset,
                len: payload.len(),
            },
        };
        debug!(
            "dv record {} at {}: {:?} {:?} storage={} tariff={}",
            record.key,
            offset,
            record.measurement_type,
            record.value_information,
            record.storage_number,
            record.tariff
        );
        records.push(record);
    }

    records.notes = notes;
    Ok(records)
}

/// Date and date-time VIFs turn plain integers into packed calendar types.
fn refine_encoding(encoding: DataEncoding, value_information: ValueInformation) -> DataEncoding {
    match (value_information, encoding) {
        (ValueInformation::Date, DataEncoding::Int { bytes: 2 }) => DataEncoding::DateG,
        (ValueInformation::DateTime, DataEncoding::Int { bytes: 4 }) => DataEncoding::DateTimeF,
        (ValueInformation::DateTime, DataEncoding::Int { bytes: 6 }) => DataEncoding::DateTimeI,
        _ => encoding,
    }
}
