//! # Telegrams
//!
//! A [`Telegram`] owns the decrypted bytes of one application-layer message,
//! the records scanned from them, and an annotation side-channel that maps
//! byte offsets to human readable explanations.
//!
//! The `extract_*` helpers combine a key lookup with payload decoding and
//! return the payload offset together with the value, so drivers can attach
//! their own explanation to the right bytes.

use crate::error::DvError;
use crate::payload::data_encoding::{decode_uint_le, DvValue};
use crate::payload::dif::DataEncoding;
use crate::payload::record::{scan, DvRecords, Explanation, RecordDescriptor};
use crate::units::{convert, Unit};
use chrono::{NaiveDate, NaiveDateTime};

/// One decrypted telegram and its scanned records.
#[derive(Debug, Clone)]
pub struct Telegram {
    bytes: Vec<u8>,
    start: usize,
    records: DvRecords,
    explanations: Vec<Explanation>,
}

impl Telegram {
    /// Scans a telegram whose data records start at the first byte.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, DvError> {
        Self::parse_at(bytes, 0)
    }

    /// Scans a telegram whose data records start at `start`. Offsets in
    /// records and explanations stay absolute within `bytes`.
    pub fn parse_at(bytes: Vec<u8>, start: usize) -> Result<Self, DvError> {
        let mut records = scan(&bytes, start)?;
        let explanations = records.take_notes();
        Ok(Self {
            bytes,
            start,
            records,
            explanations,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offset of the first data record.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn records(&self) -> &DvRecords {
        &self.records
    }

    pub fn explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    /// Appends `text` to the explanation at `offset` and marks it understood.
    pub fn add_more_explanation(&mut self, offset: usize, text: impl AsRef<str>) {
        match self.explanations.iter_mut().find(|e| e.offset == offset) {
            Some(explanation) => {
                explanation.text.push_str(text.as_ref());
                explanation.understood = true;
            }
            None => {
                let mut explanation = Explanation::new(offset, text.as_ref().trim_start());
                explanation.understood = true;
                let at = self.explanations.partition_point(|e| e.offset <= offset);
                self.explanations.insert(at, explanation);
            }
        }
    }

    /// Renders the explanations, one `offset: text` line each.
    pub fn analyse(&self) -> String {
        self.explanations
            .iter()
            .map(|e| {
                let mark = if e.understood { "* " } else { "" };
                format!("{:02x}: {mark}{}\n", e.offset, e.text)
            })
            .collect()
    }

    fn record(&self, key: &str) -> Result<&RecordDescriptor, DvError> {
        self.records
            .get(key)
            .ok_or_else(|| DvError::KeyNotFound(key.to_string()))
    }

    /// Decodes the record under `key`.
    pub fn extract_value(&self, key: &str) -> Result<(usize, DvValue), DvError> {
        let record = self.record(key)?;
        Ok((record.byte_span.offset, record.decode(&self.bytes)?))
    }

    /// Numeric value of `key`, scaled into the record's own unit.
    pub fn extract_double(&self, key: &str) -> Result<(usize, f64), DvError> {
        let record = self.record(key)?;
        let value = record.decode(&self.bytes)?;
        let scaled = value
            .scaled(record.exponent, record.is_negated())
            .ok_or_else(|| {
                DvError::UnsupportedEncoding(format!(
                    "record {key} holds {} which is not numeric",
                    record.data_encoding.description()
                ))
            })?;
        Ok((record.byte_span.offset, scaled))
    }

    /// Numeric value of `key`, converted into `unit`.
    pub fn extract_double_in(&self, key: &str, unit: Unit) -> Result<(usize, f64), DvError> {
        let record = self.record(key)?;
        let from = record.unit.ok_or_else(|| {
            DvError::UnsupportedEncoding(format!("record {key} has no unit to convert to {unit}"))
        })?;
        let (offset, value) = self.extract_double(key)?;
        Ok((offset, convert(value, from, unit)?))
    }

    /// Raw unsigned payload of `key`, ignoring scaling.
    pub fn extract_uint(&self, key: &str) -> Result<(usize, u64), DvError> {
        let record = self.record(key)?;
        match record.data_encoding {
            DataEncoding::Int { bytes } => {
                let offset = record.byte_span.offset;
                let payload = record.payload(&self.bytes)?;
                Ok((offset, decode_uint_le(payload, usize::from(bytes), offset)?))
            }
            DataEncoding::Bcd { .. } => match record.decode(&self.bytes)? {
                DvValue::Integer(v) if v >= 0 => Ok((record.byte_span.offset, v as u64)),
                _ => Err(DvError::UnsupportedEncoding(format!("record {key} is negative"))),
            },
            other => Err(DvError::UnsupportedEncoding(format!(
                "record {key} holds {}, not an integer",
                other.description()
            ))),
        }
    }

    /// Lowest byte of the unsigned payload of `key`.
    pub fn extract_u8(&self, key: &str) -> Result<(usize, u8), DvError> {
        let (offset, value) = self.extract_uint(key)?;
        Ok((offset, (value & 0xFF) as u8))
    }

    /// Date of `key`; date-time records yield their date part.
    /// `None` when the meter flagged the date as not set.
    pub fn extract_date(&self, key: &str) -> Result<(usize, Option<NaiveDate>), DvError> {
        let (offset, value) = self.extract_value(key)?;
        match value {
            DvValue::Date(d) => Ok((offset, Some(d))),
            DvValue::DateTime(dt) => Ok((offset, Some(dt.date()))),
            DvValue::NotSet => Ok((offset, None)),
            _ => Err(DvError::UnsupportedEncoding(format!("record {key} is not a date"))),
        }
    }

    /// Date and time of `key`; plain dates are taken at midnight.
    pub fn extract_datetime(&self, key: &str) -> Result<(usize, Option<NaiveDateTime>), DvError> {
        let (offset, value) = self.extract_value(key)?;
        match value {
            DvValue::DateTime(dt) => Ok((offset, Some(dt))),
            DvValue::Date(d) => Ok((offset, d.and_hms_opt(0, 0, 0))),
            DvValue::NotSet => Ok((offset, None)),
            _ => Err(DvError::UnsupportedEncoding(format!("record {key} is not a date"))),
        }
    }

    /// Text of `key` in reading order.
    pub fn extract_text(&self, key: &str) -> Result<(usize, String), DvError> {
        let (offset, value) = self.extract_value(key)?;
        value
            .text()
            .map(|t| (offset, t))
            .ok_or_else(|| DvError::UnsupportedEncoding(format!("record {key} is not text")))
    }
}
