//! Data Information Block parsing.
//!
//! The DIF selects the function (instantaneous, maximum, ...) and the raw
//! data shape of a record; DIFE bytes extend storage number, tariff and
//! subunit.

use crate::constants::*;
use crate::error::DvError;
use crate::payload::cursor::DvCursor;
use crate::payload::record::Explanation;
use serde::Serialize;

/// Function field of the DIF. `Unknown` doubles as the selector wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MeasurementType {
    Instantaneous,
    Maximum,
    Minimum,
    AtError,
    Unknown,
}

impl MeasurementType {
    pub fn from_dif(dif: u8) -> Self {
        match dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION {
            0x00 => MeasurementType::Instantaneous,
            0x10 => MeasurementType::Maximum,
            0x20 => MeasurementType::Minimum,
            _ => MeasurementType::AtError,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MeasurementType::Instantaneous => "Instantaneous value",
            MeasurementType::Maximum => "Maximum value",
            MeasurementType::Minimum => "Minimum value",
            MeasurementType::AtError => "Value during error state",
            MeasurementType::Unknown => "Unknown",
        }
    }
}

/// Shape of a record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataEncoding {
    /// No data.
    None,
    /// Little-endian two's complement integer of this many bytes.
    Int { bytes: u8 },
    /// IEEE-754 single precision.
    Real32,
    /// Packed BCD; `negative` is set by an LVAR negative-BCD prefix.
    Bcd { digits: u8, negative: bool },
    /// Date type G (16 bit).
    DateG,
    /// Date and time type F (32 bit).
    DateTimeF,
    /// Date and time type I (48 bit).
    DateTimeI,
    /// Length-prefixed text, kept verbatim.
    Text { len: u8 },
    /// Selection for readout; carries no data.
    Selection,
    /// Manufacturer specific data up to the end of the telegram.
    ManufacturerData,
}

impl DataEncoding {
    /// Encoding selected by the DIF data field. LVAR is resolved separately.
    pub fn from_dif(dif: u8) -> Option<Self> {
        match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
            0x0 => Some(DataEncoding::None),
            0x1 => Some(DataEncoding::Int { bytes: 1 }),
            0x2 => Some(DataEncoding::Int { bytes: 2 }),
            0x3 => Some(DataEncoding::Int { bytes: 3 }),
            0x4 => Some(DataEncoding::Int { bytes: 4 }),
            0x5 => Some(DataEncoding::Real32),
            0x6 => Some(DataEncoding::Int { bytes: 6 }),
            0x7 => Some(DataEncoding::Int { bytes: 8 }),
            0x8 => Some(DataEncoding::Selection),
            0x9 => Some(DataEncoding::Bcd { digits: 2, negative: false }),
            0xA => Some(DataEncoding::Bcd { digits: 4, negative: false }),
            0xB => Some(DataEncoding::Bcd { digits: 6, negative: false }),
            0xC => Some(DataEncoding::Bcd { digits: 8, negative: false }),
            0xE => Some(DataEncoding::Bcd { digits: 12, negative: false }),
            _ => None,
        }
    }

    /// Resolves an LVAR length byte into a concrete encoding.
    pub fn from_lvar(len: u8) -> Result<Self, DvError> {
        match len {
            0x00..=0xBF => Ok(DataEncoding::Text { len }),
            0xC0..=0xC9 => Ok(DataEncoding::Bcd {
                digits: (len - 0xC0) * 2,
                negative: false,
            }),
            0xD0..=0xD9 => Ok(DataEncoding::Bcd {
                digits: (len - 0xD0) * 2,
                negative: true,
            }),
            0xE0..=0xE8 => Ok(DataEncoding::Int { bytes: len - 0xE0 }),
            _ => Err(DvError::UnsupportedEncoding(format!(
                "LVAR length byte 0x{len:02X}"
            ))),
        }
    }

    /// Payload length in bytes; manufacturer data has no fixed length.
    pub fn len(&self) -> usize {
        match self {
            DataEncoding::None | DataEncoding::Selection | DataEncoding::ManufacturerData => 0,
            DataEncoding::Int { bytes } => usize::from(*bytes),
            DataEncoding::Real32 | DataEncoding::DateTimeF => 4,
            DataEncoding::Bcd { digits, .. } => usize::from(*digits).div_ceil(2),
            DataEncoding::DateG => 2,
            DataEncoding::DateTimeI => 6,
            DataEncoding::Text { len } => usize::from(*len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn description(&self) -> String {
        match self {
            DataEncoding::None => "No data".to_string(),
            DataEncoding::Int { bytes } => format!("{} Bit Integer/Binary", usize::from(*bytes) * 8),
            DataEncoding::Real32 => "32 Bit Real".to_string(),
            DataEncoding::Bcd { digits, negative: false } => format!("{digits} digit BCD"),
            DataEncoding::Bcd { digits, negative: true } => format!("{digits} digit negative BCD"),
            DataEncoding::DateG => "Date type G".to_string(),
            DataEncoding::DateTimeF => "Date and time type F".to_string(),
            DataEncoding::DateTimeI => "Date and time type I".to_string(),
            DataEncoding::Text { len } => format!("{len} byte text"),
            DataEncoding::Selection => "Selection for readout".to_string(),
            DataEncoding::ManufacturerData => "Manufacturer specific data".to_string(),
        }
    }
}

/// A parsed data information block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataInformationBlock {
    pub dif: u8,
    pub dife: Vec<u8>,
    pub measurement_type: MeasurementType,
    /// `None` when the data field is LVAR (0xD).
    pub encoding: Option<DataEncoding>,
    pub storage_number: u32,
    pub tariff: u32,
    pub subunit: u32,
}

impl DataInformationBlock {
    /// All bytes of the block, DIF first.
    pub fn bytes(&self) -> Vec<u8> {
        std::iter::once(self.dif).chain(self.dife.iter().copied()).collect()
    }
}

/// ORs `bits << shift` into `acc`; `None` if a set bit lands above bit 31.
fn pack_bits(acc: u32, bits: u8, shift: u32) -> Option<u32> {
    let placed = u64::from(bits).checked_shl(shift)?;
    u32::try_from(u64::from(acc) | placed).ok()
}

/// Parses a DIF and its DIFE chain. `dif` has already been read at `offset`.
pub fn parse_dib(
    cursor: &mut DvCursor<'_>,
    dif: u8,
    offset: usize,
    notes: &mut Vec<Explanation>,
) -> Result<DataInformationBlock, DvError> {
    let measurement_type = MeasurementType::from_dif(dif);
    let data_field = dif & MBUS_DATA_RECORD_DIF_MASK_DATA;
    let encoding = match data_field {
        0xD => None,
        _ => Some(DataEncoding::from_dif(dif).ok_or_else(|| {
            DvError::UnsupportedEncoding(format!("DIF 0x{dif:02X} at offset {offset}"))
        })?),
    };

    let mut storage_number = u32::from((dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6);
    let mut tariff = 0u32;
    let mut subunit = 0u32;
    let mut dife = Vec::new();

    let shape = encoding
        .map(|e| e.description())
        .unwrap_or_else(|| "Variable length".to_string());
    let storage_note = if storage_number != 0 { " storagenr=1" } else { "" };
    notes.push(Explanation::new(
        offset,
        format!("{dif:02X} dif ({shape} {}{storage_note})", measurement_type.description()),
    ));

    let mut more = dif & MBUS_DIB_DIF_EXTENSION_BIT != 0;
    while more {
        if dife.len() == MBUS_MAX_DIFE {
            return Err(DvError::MalformedDifChain {
                offset: cursor.offset(),
            });
        }
        let at = cursor.offset();
        let byte = cursor.next_byte()?;
        let shift = dife.len() as u32;
        let overflow = || DvError::MalformedDifChain { offset: at };
        storage_number = pack_bits(
            storage_number,
            byte & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO,
            1 + 4 * shift,
        )
        .ok_or_else(overflow)?;
        tariff = pack_bits(tariff, (byte & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4, 2 * shift)
            .ok_or_else(overflow)?;
        subunit = pack_bits(subunit, (byte & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6, shift)
            .ok_or_else(overflow)?;
        dife.push(byte);
        notes.push(Explanation::new(
            at,
            format!("{byte:02X} dife (subunit={subunit} tariff={tariff} storagenr={storage_number})"),
        ));
        more = byte & MBUS_DIB_DIF_EXTENSION_BIT != 0;
    }

    Ok(DataInformationBlock {
        dif,
        dife,
        measurement_type,
        encoding,
        storage_number,
        tariff,
        subunit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dib(data: &[u8]) -> Result<DataInformationBlock, DvError> {
        let mut cursor = DvCursor::new(data, 0)?;
        let dif = cursor.next_byte()?;
        parse_dib(&mut cursor, dif, 0, &mut Vec::new())
    }

    #[test]
    fn test_function_field() {
        assert_eq!(dib(&[0x03]).unwrap().measurement_type, MeasurementType::Instantaneous);
        assert_eq!(dib(&[0x13]).unwrap().measurement_type, MeasurementType::Maximum);
        assert_eq!(dib(&[0x23]).unwrap().measurement_type, MeasurementType::Minimum);
        assert_eq!(dib(&[0x33]).unwrap().measurement_type, MeasurementType::AtError);
    }

    #[test]
    fn test_data_field_lengths() {
        let lengths = [
            (0x00, 0),
            (0x01, 1),
            (0x02, 2),
            (0x03, 3),
            (0x04, 4),
            (0x05, 4),
            (0x06, 6),
            (0x07, 8),
            (0x08, 0),
            (0x09, 1),
            (0x0A, 2),
            (0x0B, 3),
            (0x0C, 4),
            (0x0E, 6),
        ];
        for (dif, len) in lengths {
            assert_eq!(DataEncoding::from_dif(dif).unwrap().len(), len, "DIF {dif:02X}");
        }
        assert!(DataEncoding::from_dif(0x0D).is_none());
    }

    #[test]
    fn test_storage_number_from_dif() {
        let block = dib(&[0x42]).unwrap();
        assert_eq!(block.storage_number, 1);
        assert_eq!(block.tariff, 0);
    }

    #[test]
    fn test_dife_chain() {
        // storage bit in DIF, DIFE: subunit 1, tariff 2, storage 3
        let block = dib(&[0xC4, 0x63]).unwrap();
        assert_eq!(block.dife, vec![0x63]);
        assert_eq!(block.storage_number, 1 | (3 << 1));
        assert_eq!(block.tariff, 2);
        assert_eq!(block.subunit, 1);

        // Second DIFE shifts its fields further up.
        let block = dib(&[0x84, 0x81, 0x11]).unwrap();
        assert_eq!(block.storage_number, (1 << 1) | (1 << 5));
        assert_eq!(block.tariff, 1 << 2);
    }

    #[test]
    fn test_dife_chain_too_long() {
        let mut data = vec![0x84];
        data.extend(std::iter::repeat(0x80).take(11));
        assert!(matches!(dib(&data), Err(DvError::MalformedDifChain { .. })));
    }

    #[test]
    fn test_long_dife_chain_with_empty_high_fields() {
        // Nine and ten DIFEs are within the limit; unused upper DIFEs carry no bits.
        for count in [9, 10] {
            let mut data = vec![0xC1];
            data.extend(std::iter::repeat(0x80).take(count - 1));
            data.push(0x00);
            let block = dib(&data).unwrap();
            assert_eq!(block.dife.len(), count);
            assert_eq!(block.storage_number, 1);
        }
    }

    #[test]
    fn test_storage_number_beyond_32_bits() {
        // The ninth DIFE would place storage bits at bit 33.
        let mut data = vec![0x81];
        data.extend(std::iter::repeat(0x81).take(8));
        data.push(0x01);
        assert_eq!(dib(&data).unwrap_err(), DvError::MalformedDifChain { offset: 9 });

        // Bit 31 is the highest storage bit that fits.
        let mut data = vec![0xC1];
        data.extend(std::iter::repeat(0x80).take(7));
        data.push(0x04);
        assert_eq!(dib(&data).unwrap().storage_number, (1 << 31) | 1);
    }

    #[test]
    fn test_lvar_lengths() {
        assert_eq!(DataEncoding::from_lvar(0x05).unwrap(), DataEncoding::Text { len: 5 });
        assert_eq!(
            DataEncoding::from_lvar(0xD2).unwrap(),
            DataEncoding::Bcd { digits: 4, negative: true }
        );
        assert_eq!(DataEncoding::from_lvar(0xE3).unwrap().len(), 3);
        assert!(DataEncoding::from_lvar(0xFA).is_err());
    }
}
