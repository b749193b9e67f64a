//! # DV Payload Decoding
//!
//! This module turns the payload bytes of a record into an engineering value
//! according to the record's [`DataEncoding`]: little-endian integers, BCD,
//! IEEE reals, packed dates (types G, F and I) and verbatim text.

use crate::error::DvError;
use crate::payload::dif::DataEncoding;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A decoded payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DvValue {
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A date or time the meter flagged as not yet set.
    NotSet,
    Text(Vec<u8>),
    Raw(Vec<u8>),
    None,
}

impl DvValue {
    /// Numeric view of integer and real values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DvValue::Integer(v) => Some(*v as f64),
            DvValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Applies a power-of-ten exponent and optional sign inversion.
    pub fn scaled(&self, exponent: i32, negated: bool) -> Option<f64> {
        let value = self.as_f64()? * 10f64.powi(exponent);
        Some(if negated { -value } else { value })
    }

    /// Text bytes as a string; the standard transmits characters last first.
    pub fn text(&self) -> Option<String> {
        match self {
            DvValue::Text(bytes) => Some(bytes.iter().rev().map(|b| *b as char).collect()),
            _ => None,
        }
    }
}

/// Decodes `payload` (which starts at absolute `offset`) per `encoding`.
pub fn decode_value(encoding: DataEncoding, payload: &[u8], offset: usize) -> Result<DvValue, DvError> {
    let needed = encoding.len();
    if payload.len() < needed {
        return Err(DvError::PayloadTruncated {
            offset,
            needed,
            available: payload.len(),
        });
    }
    let data = &payload[..needed];

    match encoding {
        DataEncoding::None | DataEncoding::Selection => Ok(DvValue::None),
        DataEncoding::Int { bytes } => {
            decode_int_le(data, usize::from(bytes), offset).map(DvValue::Integer)
        }
        DataEncoding::Real32 => Ok(DvValue::Real(f64::from(decode_real32(data, offset)?))),
        DataEncoding::Bcd { negative: false, .. } => decode_bcd(data, offset).map(DvValue::Integer),
        DataEncoding::Bcd { negative: true, .. } => {
            // The LVAR byte already carries the sign; a 0xF top nibble is not a digit here.
            if let Some((i, &byte)) = data.iter().enumerate().last() {
                if byte >> 4 == 0xF {
                    return Err(DvError::InvalidBcdDigit { offset: offset + i, byte });
                }
            }
            decode_bcd(data, offset).map(|v| DvValue::Integer(-v))
        }
        DataEncoding::DateG => {
            Ok(decode_date_g(data, offset)?.map_or(DvValue::NotSet, DvValue::Date))
        }
        DataEncoding::DateTimeF => {
            Ok(decode_datetime_f(data, offset)?.map_or(DvValue::NotSet, DvValue::DateTime))
        }
        DataEncoding::DateTimeI => {
            Ok(decode_datetime_i(data, offset)?.map_or(DvValue::NotSet, DvValue::DateTime))
        }
        DataEncoding::Text { .. } => Ok(DvValue::Text(data.to_vec())),
        DataEncoding::ManufacturerData => Ok(DvValue::Raw(payload.to_vec())),
    }
}

/// Decodes a little-endian two's complement integer of 1..=8 bytes.
pub fn decode_int_le(data: &[u8], size: usize, offset: usize) -> Result<i64, DvError> {
    if size == 0 || size > 8 {
        return Err(DvError::UnsupportedEncoding(format!("{size} byte integer")));
    }
    let raw = decode_uint_le(data, size, offset)?;
    let shift = 64 - 8 * size as u32;
    Ok(((raw << shift) as i64) >> shift)
}

/// Fails with `PayloadTruncated` unless `data` holds at least `needed` bytes.
fn ensure_len(data: &[u8], needed: usize, offset: usize) -> Result<(), DvError> {
    if data.len() < needed {
        return Err(DvError::PayloadTruncated {
            offset,
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Decodes a little-endian unsigned integer of 1..=8 bytes.
pub fn decode_uint_le(data: &[u8], size: usize, offset: usize) -> Result<u64, DvError> {
    if size > 8 {
        return Err(DvError::UnsupportedEncoding(format!("{size} byte integer")));
    }
    ensure_len(data, size, offset)?;
    Ok(data[..size]
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Decodes a little-endian IEEE-754 single precision value.
pub fn decode_real32(data: &[u8], offset: usize) -> Result<f32, DvError> {
    ensure_len(data, 4, offset)?;
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[..4]);
    Ok(f32::from_le_bytes(bytes))
}

/// Decodes packed BCD, least significant byte first.
///
/// A most significant nibble of 0xF marks a negative number.
pub fn decode_bcd(data: &[u8], offset: usize) -> Result<i64, DvError> {
    let mut value = 0i64;
    let mut negative = false;
    for (i, &byte) in data.iter().enumerate().rev() {
        let high = byte >> 4;
        let low = byte & 0x0F;
        let is_top = i == data.len() - 1;
        if is_top && high == 0xF {
            negative = true;
        } else if high > 9 {
            return Err(DvError::InvalidBcdDigit { offset: offset + i, byte });
        } else {
            value = value * 10 + i64::from(high);
        }
        if low > 9 {
            return Err(DvError::InvalidBcdDigit { offset: offset + i, byte });
        }
        value = value * 10 + i64::from(low);
    }
    Ok(if negative { -value } else { value })
}

/// Encodes a non-negative value as packed BCD of `bytes` bytes, least significant first.
pub fn encode_bcd(mut value: u64, bytes: usize) -> Vec<u8> {
    let mut out = vec![0u8; bytes];
    for slot in out.iter_mut() {
        let low = (value % 10) as u8;
        value /= 10;
        let high = (value % 10) as u8;
        value /= 10;
        *slot = (high << 4) | low;
    }
    out
}

fn year_of(low_byte: u8, high_byte: u8) -> i32 {
    i32::from(((low_byte & 0xE0) >> 5) | ((high_byte & 0xF0) >> 1))
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DvError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DvError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
}

/// Decodes a type G date. `None` when the meter has not set it.
pub fn decode_date_g(data: &[u8], offset: usize) -> Result<Option<NaiveDate>, DvError> {
    ensure_len(data, 2, offset)?;
    let (b0, b1) = (data[0], data[1]);
    if (b0 == 0x00 && b1 == 0x00) || (b0 == 0xFF && b1 == 0xFF) {
        return Ok(None);
    }
    let day = u32::from(b0 & 0x1F);
    let month = u32::from(b1 & 0x0F);
    let year = 2000 + year_of(b0, b1);
    calendar_date(year, month, day).map(Some)
}

fn time_of(date: NaiveDate, hour: u8, minute: u8, second: u8) -> Result<NaiveDateTime, DvError> {
    date.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
        .ok_or_else(|| DvError::InvalidDate(format!("{date} {hour:02}:{minute:02}:{second:02}")))
}

/// Decodes a type F date and time. `None` when the invalid bit is set.
pub fn decode_datetime_f(data: &[u8], offset: usize) -> Result<Option<NaiveDateTime>, DvError> {
    ensure_len(data, 4, offset)?;
    if data[0] & 0x80 != 0 {
        return Ok(None);
    }
    let minute = data[0] & 0x3F;
    let hour = data[1] & 0x1F;
    let century = i32::from((data[1] & 0x60) >> 5);
    let day = u32::from(data[2] & 0x1F);
    let month = u32::from(data[3] & 0x0F);
    let year = 2000 + century * 100 + year_of(data[2], data[3]);
    let date = calendar_date(year, month, day)?;
    time_of(date, hour, minute, 0).map(Some)
}

/// Decodes a type I date and time. `None` when the invalid bit is set.
pub fn decode_datetime_i(data: &[u8], offset: usize) -> Result<Option<NaiveDateTime>, DvError> {
    ensure_len(data, 6, offset)?;
    if data[1] & 0x80 != 0 {
        return Ok(None);
    }
    let second = data[0] & 0x3F;
    let minute = data[1] & 0x3F;
    let hour = data[2] & 0x1F;
    let day = u32::from(data[3] & 0x1F);
    let month = u32::from(data[4] & 0x0F);
    let year = 2000 + year_of(data[3], data[4]);
    let date = calendar_date(year, month, day)?;
    time_of(date, hour, minute, second).map(Some)
}

/// Packs a date as type G.
pub fn encode_date_g(date: NaiveDate) -> [u8; 2] {
    use chrono::Datelike;
    let year = (date.year() - 2000).rem_euclid(128) as u8;
    let b0 = ((year & 0x07) << 5) | date.day() as u8;
    let b1 = ((year & 0x78) << 1) | date.month() as u8;
    [b0, b1]
}
