//! Value Information Block parsing.
//!
//! A VIB is one VIF byte, optionally followed by an extension-table code,
//! a plain-text unit, and a chain of VIFE modifier bytes.

use crate::constants::*;
use crate::error::DvError;
use crate::payload::cursor::DvCursor;
use crate::payload::record::Explanation;
use crate::payload::vif_maps::{lookup_primary_vif, lookup_vife_fb, lookup_vife_fd};
use crate::units::Unit;
use serde::Serialize;

/// Physical quantity and encoding family selected by a VIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueInformation {
    None,
    EnergyWh,
    EnergyMJ,
    Volume,
    Mass,
    OnTime,
    OperatingTime,
    PowerW,
    PowerJh,
    VolumeFlow,
    VolumeFlowExt,
    VolumeFlowExtS,
    MassFlow,
    FlowTemperature,
    ReturnTemperature,
    TemperatureDifference,
    ExternalTemperature,
    Pressure,
    Date,
    DateTime,
    HeatCostAllocation,
    Reserved,
    AveragingDuration,
    ActualityDuration,
    FabricationNo,
    EnhancedIdentification,
    BusAddress,
    PlainText,
    AnyVif,
    ManufacturerSpecific,
    AccessNumber,
    Medium,
    Manufacturer,
    ModelVersion,
    HardwareVersion,
    FirmwareVersion,
    SoftwareVersion,
    ErrorFlags,
    DigitalOutput,
    DigitalInput,
    Voltage,
    Current,
    ResetCounter,
    CumulationCounter,
    RemainingBatteryLife,
    ExtensionFd,
    ExtensionFb,
}

/// Resolved meaning of a VIF code.
#[derive(Debug, Clone, PartialEq)]
pub struct VifInfo {
    /// Raw code; 0xFD table codes are offset by 0x100, 0xFB codes by 0x200.
    pub vif: u16,
    pub value_information: ValueInformation,
    /// Unit the scaled value is expressed in, when it maps onto a known one.
    pub unit: Option<Unit>,
    /// Power of ten applied to the raw value to reach `unit`.
    pub exponent: i32,
    pub description: String,
}

impl VifInfo {
    pub(crate) fn unknown(vif: u16, description: &str) -> Self {
        Self {
            vif,
            value_information: ValueInformation::None,
            unit: None,
            exponent: 0,
            description: description.to_string(),
        }
    }
}

/// Effect of one combinable VIFE byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VifeModifier {
    /// Record error code (E000 xxxx).
    RecordError(u8),
    /// Rate per time unit: 0x20 second ... 0x26 year, 0x27 revolution.
    PerTime(u8),
    /// Multiplicative correction factor 10^n.
    Multiplier(i32),
    /// Accumulation of negative contributions; reported with inverted sign.
    Negated,
    /// Accumulation of positive contributions only.
    PositiveOnly,
    /// Value of the manufacturer's private VIFE namespace.
    Vendor(u8),
    /// Any other standard VIFE, kept verbatim.
    Other(u8),
}

impl VifeModifier {
    fn from_code(code: u8) -> Self {
        match code & 0x7F {
            c @ 0x00..=0x1F => VifeModifier::RecordError(c),
            c @ 0x20..=0x27 => VifeModifier::PerTime(c),
            0x3B => VifeModifier::PositiveOnly,
            0x3C => VifeModifier::Negated,
            c @ 0x70..=0x77 => VifeModifier::Multiplier(i32::from(c - 0x70) - 6),
            0x7D => VifeModifier::Multiplier(3),
            c => VifeModifier::Other(c),
        }
    }

    pub fn description(&self) -> String {
        match self {
            VifeModifier::RecordError(c) => format!("record error 0x{c:02X}"),
            VifeModifier::PerTime(c) => {
                let per = match c {
                    0x20 => "second",
                    0x21 => "minute",
                    0x22 => "hour",
                    0x23 => "day",
                    0x24 => "week",
                    0x25 => "month",
                    0x26 => "year",
                    _ => "revolution/measurement",
                };
                format!("per {per}")
            }
            VifeModifier::Multiplier(n) => format!("multiplier 10^{n}"),
            VifeModifier::Negated => "accumulation of negative contributions".to_string(),
            VifeModifier::PositiveOnly => "accumulation of positive contributions".to_string(),
            VifeModifier::Vendor(c) => format!("vendor 0x{c:02X}"),
            VifeModifier::Other(c) => format!("combinable 0x{c:02X}"),
        }
    }
}

/// A parsed value information block.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInformationBlock {
    /// Every byte of the block, VIF first.
    pub bytes: Vec<u8>,
    pub info: VifInfo,
    pub modifiers: Vec<VifeModifier>,
    pub plain_text_unit: Option<String>,
}

impl ValueInformationBlock {
    /// Unit after applying the modifiers; rates per time have no unit here.
    pub fn unit(&self) -> Option<Unit> {
        if self
            .modifiers
            .iter()
            .any(|m| matches!(m, VifeModifier::PerTime(_)))
        {
            None
        } else {
            self.info.unit
        }
    }

    /// Exponent after applying multiplicative corrections.
    pub fn exponent(&self) -> i32 {
        self.info.exponent
            + self
                .modifiers
                .iter()
                .map(|m| match m {
                    VifeModifier::Multiplier(n) => *n,
                    _ => 0,
                })
                .sum::<i32>()
    }

    pub fn is_negated(&self) -> bool {
        self.modifiers.contains(&VifeModifier::Negated)
    }
}

/// Parses a value information block at the cursor.
///
/// Annotations for each consumed byte are pushed onto `notes`.
pub fn parse_vib(
    cursor: &mut DvCursor<'_>,
    notes: &mut Vec<Explanation>,
) -> Result<ValueInformationBlock, DvError> {
    let start = cursor.offset();
    let vif = cursor.next_byte()?;
    let mut bytes = vec![vif];
    let mut plain_text_unit = None;
    let mut more = vif & MBUS_DIB_VIF_EXTENSION_BIT != 0;

    let info = match vif & MBUS_DIB_VIF_WITHOUT_EXTENSION {
        MBUS_DIB_VIF_EXTENSION_FD | MBUS_DIB_VIF_EXTENSION_FB => {
            notes.push(Explanation::new(start, format!("{vif:02X} vif (Extension table)")));
            let at = cursor.offset();
            let code = cursor.next_byte()?;
            bytes.push(code);
            more = code & MBUS_DIB_VIF_EXTENSION_BIT != 0;
            let info = if vif & MBUS_DIB_VIF_WITHOUT_EXTENSION == MBUS_DIB_VIF_EXTENSION_FD {
                lookup_vife_fd(code)
            } else {
                lookup_vife_fb(code)
            };
            notes.push(Explanation::new(at, format!("{code:02X} vife ({})", info.description)));
            info
        }
        MBUS_DIB_VIF_PLAIN_TEXT => {
            notes.push(Explanation::new(start, format!("{vif:02X} vif (Plain text unit)")));
            // The VIFE chain precedes the length byte of the text.
            let mut chain = Vec::new();
            if more {
                chain = read_vife_chain(cursor, &mut bytes, notes, false)?;
                more = false;
            }
            let at = cursor.offset();
            let len = cursor.next_byte()?;
            if len > MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE {
                return Err(DvError::UnsupportedEncoding(format!(
                    "plain text VIF of {len} bytes at offset {at}"
                )));
            }
            let text = cursor.take(usize::from(len))?;
            bytes.push(len);
            bytes.extend_from_slice(text);
            let unit: String = text.iter().rev().map(|b| *b as char).collect();
            notes.push(Explanation::new(at, format!("{len:02X} plain text unit ({unit})")));
            plain_text_unit = Some(unit);
            let mut info = lookup_primary_vif(vif);
            info.description = "Plain text unit".to_string();
            return Ok(ValueInformationBlock {
                bytes,
                info,
                modifiers: chain,
                plain_text_unit,
            });
        }
        _ => {
            let info = lookup_primary_vif(vif);
            notes.push(Explanation::new(start, format!("{vif:02X} vif ({})", info.description)));
            info
        }
    };

    let vendor = (vif & MBUS_DIB_VIF_WITHOUT_EXTENSION) == MBUS_DIB_VIF_MANUFACTURER_SPECIFIC;
    let modifiers = if more {
        read_vife_chain(cursor, &mut bytes, notes, vendor)?
    } else {
        Vec::new()
    };

    Ok(ValueInformationBlock {
        bytes,
        info,
        modifiers,
        plain_text_unit,
    })
}

fn read_vife_chain(
    cursor: &mut DvCursor<'_>,
    bytes: &mut Vec<u8>,
    notes: &mut Vec<Explanation>,
    mut vendor: bool,
) -> Result<Vec<VifeModifier>, DvError> {
    let mut modifiers = Vec::new();
    loop {
        if modifiers.len() == MBUS_MAX_VIFE {
            return Err(DvError::MalformedVifChain {
                offset: cursor.offset(),
            });
        }
        let at = cursor.offset();
        let vife = cursor.next_byte()?;
        bytes.push(vife);
        let modifier = if vendor {
            VifeModifier::Vendor(vife & 0x7F)
        } else if vife & 0x7F == MBUS_DIB_VIFE_MANUFACTURER_SPECIFIC {
            vendor = true;
            VifeModifier::Vendor(vife & 0x7F)
        } else {
            VifeModifier::from_code(vife)
        };
        notes.push(Explanation::new(at, format!("{vife:02X} vife ({})", modifier.description())));
        modifiers.push(modifier);
        if vife & MBUS_DIB_VIF_EXTENSION_BIT == 0 {
            return Ok(modifiers);
        }
    }
}
