//! VIF/VIFE Mapping Tables and Lookup Functions
//!
//! This module provides lookups for M-Bus Value Information Fields (VIF)
//! and the 0xFD / 0xFB extension tables as defined in EN 13757-3. Each code
//! resolves to a value-information family, the unit the decoded value is
//! expressed in, and the power-of-ten exponent relative to that unit.

use crate::constants::{VIF_TABLE_FB_OFFSET, VIF_TABLE_FD_OFFSET};
use crate::payload::vif::{ValueInformation, VifInfo};
use crate::units::Unit;

/// One contiguous range of VIF codes sharing a family.
///
/// `(first code, last code, family, name, base unit text, base exponent,
/// unit, unit exponent)`. For a code `c` the exponents are
/// `c - first + base exponent` and `c - first + unit exponent`.
type VifRange = (
    u8,
    u8,
    ValueInformation,
    &'static str,
    &'static str,
    i32,
    Option<Unit>,
    i32,
);

/// Primary VIF codes (0x00–0x7F, extension bit masked off).
pub const VIF_CODES: &[VifRange] = &[
    (0x00, 0x07, ValueInformation::EnergyWh, "Energy", "Wh", -3, Some(Unit::Kwh), -6),
    (0x08, 0x0F, ValueInformation::EnergyMJ, "Energy", "J", 0, Some(Unit::Mj), -6),
    (0x10, 0x17, ValueInformation::Volume, "Volume", "m³", -6, Some(Unit::M3), -6),
    (0x18, 0x1F, ValueInformation::Mass, "Mass", "kg", -3, None, -3),
    (0x28, 0x2F, ValueInformation::PowerW, "Power", "W", -3, Some(Unit::Kw), -6),
    (0x30, 0x37, ValueInformation::PowerJh, "Power", "J/h", 0, None, 0),
    (0x38, 0x3F, ValueInformation::VolumeFlow, "Volume flow", "m³/h", -6, Some(Unit::M3h), -6),
    (0x40, 0x47, ValueInformation::VolumeFlowExt, "Volume flow", "m³/min", -7, None, -7),
    (0x48, 0x4F, ValueInformation::VolumeFlowExtS, "Volume flow", "m³/s", -9, None, -9),
    (0x50, 0x57, ValueInformation::MassFlow, "Mass flow", "kg/h", -3, None, -3),
    (0x58, 0x5B, ValueInformation::FlowTemperature, "Flow temperature", "°C", -3, Some(Unit::C), -3),
    (0x5C, 0x5F, ValueInformation::ReturnTemperature, "Return temperature", "°C", -3, Some(Unit::C), -3),
    (0x60, 0x63, ValueInformation::TemperatureDifference, "Temperature difference", "K", -3, None, -3),
    (0x64, 0x67, ValueInformation::ExternalTemperature, "External temperature", "°C", -3, Some(Unit::C), -3),
    (0x68, 0x6B, ValueInformation::Pressure, "Pressure", "bar", -3, Some(Unit::Bar), -3),
    (0x6C, 0x6C, ValueInformation::Date, "Date type G", "", 0, None, 0),
    (0x6D, 0x6D, ValueInformation::DateTime, "Date and time type F", "", 0, None, 0),
    (0x6E, 0x6E, ValueInformation::HeatCostAllocation, "Units for H.C.A.", "", 0, None, 0),
    (0x6F, 0x6F, ValueInformation::Reserved, "Reserved", "", 0, None, 0),
    (0x78, 0x78, ValueInformation::FabricationNo, "Fabrication no", "", 0, None, 0),
    (0x79, 0x79, ValueInformation::EnhancedIdentification, "Enhanced identification", "", 0, None, 0),
    (0x7A, 0x7A, ValueInformation::BusAddress, "Bus address", "", 0, None, 0),
    (0x7B, 0x7B, ValueInformation::ExtensionFb, "Extension table FB", "", 0, None, 0),
    (0x7C, 0x7C, ValueInformation::PlainText, "Plain text unit", "", 0, None, 0),
    (0x7D, 0x7D, ValueInformation::ExtensionFd, "Extension table FD", "", 0, None, 0),
    (0x7E, 0x7E, ValueInformation::AnyVif, "Any VIF", "", 0, None, 0),
    (0x7F, 0x7F, ValueInformation::ManufacturerSpecific, "Vendor extension", "", 0, None, 0),
];

/// Duration families whose last two bits select the time unit.
const VIF_DURATION_CODES: &[(u8, ValueInformation, &str)] = &[
    (0x20, ValueInformation::OnTime, "On time"),
    (0x24, ValueInformation::OperatingTime, "Operating time"),
    (0x70, ValueInformation::AveragingDuration, "Averaging duration"),
    (0x74, ValueInformation::ActualityDuration, "Actuality duration"),
];

/// Codes of the 0xFD extension table (EN 13757-3 table 14).
pub const VIFE_FD_CODES: &[VifRange] = &[
    (0x08, 0x08, ValueInformation::AccessNumber, "Access number", "", 0, None, 0),
    (0x09, 0x09, ValueInformation::Medium, "Medium", "", 0, None, 0),
    (0x0A, 0x0A, ValueInformation::Manufacturer, "Manufacturer", "", 0, None, 0),
    (0x0C, 0x0C, ValueInformation::ModelVersion, "Model/Version", "", 0, None, 0),
    (0x0D, 0x0D, ValueInformation::HardwareVersion, "Hardware version", "", 0, None, 0),
    (0x0E, 0x0E, ValueInformation::FirmwareVersion, "Firmware version", "", 0, None, 0),
    (0x0F, 0x0F, ValueInformation::SoftwareVersion, "Software version", "", 0, None, 0),
    (0x17, 0x17, ValueInformation::ErrorFlags, "Error flags", "", 0, None, 0),
    (0x1A, 0x1A, ValueInformation::DigitalOutput, "Digital output", "", 0, None, 0),
    (0x1B, 0x1B, ValueInformation::DigitalInput, "Digital input", "", 0, None, 0),
    (0x40, 0x4F, ValueInformation::Voltage, "Voltage", "V", -9, None, -9),
    (0x50, 0x5F, ValueInformation::Current, "Current", "A", -12, None, -12),
    (0x60, 0x60, ValueInformation::ResetCounter, "Reset counter", "", 0, None, 0),
    (0x61, 0x61, ValueInformation::CumulationCounter, "Cumulation counter", "", 0, None, 0),
    (0x74, 0x74, ValueInformation::RemainingBatteryLife, "Remaining battery life", "days", 0, Some(Unit::Day), 0),
];

/// Codes of the 0xFB extension table (EN 13757-3 table 12).
pub const VIFE_FB_CODES: &[VifRange] = &[
    (0x00, 0x01, ValueInformation::EnergyWh, "Energy", "MWh", -1, Some(Unit::Kwh), 2),
    (0x08, 0x09, ValueInformation::EnergyMJ, "Energy", "GJ", -1, Some(Unit::Mj), 2),
    (0x10, 0x11, ValueInformation::Volume, "Volume", "m³", 2, Some(Unit::M3), 2),
    (0x28, 0x29, ValueInformation::PowerW, "Power", "MW", -1, Some(Unit::Kw), 2),
];

fn describe(name: &str, base_unit: &str, exponent: i32) -> String {
    match (base_unit, exponent) {
        ("", _) => name.to_string(),
        (_, 0) => format!("{name} {base_unit}"),
        ("Wh" | "W" | "J", 3) => format!("{name} k{base_unit}"),
        ("Wh" | "W" | "J", 6) => format!("{name} M{base_unit}"),
        _ => format!("{name} 10^{exponent} {base_unit}"),
    }
}

fn lookup_range(table: &[VifRange], code: u8, table_offset: u16) -> Option<VifInfo> {
    table
        .iter()
        .find(|(first, last, ..)| (*first..=*last).contains(&code))
        .map(
            |(first, _, value_information, name, base_unit, base_exponent, unit, unit_exponent)| {
                let n = i32::from(code - first);
                VifInfo {
                    vif: table_offset + u16::from(code),
                    value_information: *value_information,
                    unit: *unit,
                    exponent: n + unit_exponent,
                    description: describe(name, base_unit, n + base_exponent),
                }
            },
        )
}

fn lookup_duration(code: u8) -> Option<VifInfo> {
    let (first, value_information, name) = VIF_DURATION_CODES
        .iter()
        .find(|(first, ..)| (*first..=*first + 3).contains(&code))?;
    let (unit, unit_name) = match code - first {
        0 => (Unit::Second, "seconds"),
        1 => (Unit::Minute, "minutes"),
        2 => (Unit::Hour, "hours"),
        _ => (Unit::Day, "days"),
    };
    Some(VifInfo {
        vif: u16::from(code),
        value_information: *value_information,
        unit: Some(unit),
        exponent: 0,
        description: format!("{name} {unit_name}"),
    })
}

/// Looks up primary VIF code. The extension bit is ignored.
pub fn lookup_primary_vif(code: u8) -> VifInfo {
    let code = code & 0x7F;
    lookup_duration(code)
        .or_else(|| lookup_range(VIF_CODES, code, 0))
        .unwrap_or_else(|| VifInfo::unknown(u16::from(code), "Unknown VIF"))
}

/// Looks up a code of the 0xFD extension table. The extension bit is ignored.
pub fn lookup_vife_fd(code: u8) -> VifInfo {
    let code = code & 0x7F;
    lookup_range(VIFE_FD_CODES, code, VIF_TABLE_FD_OFFSET).unwrap_or_else(|| VifInfo {
        vif: VIF_TABLE_FD_OFFSET + u16::from(code),
        value_information: ValueInformation::ExtensionFd,
        unit: None,
        exponent: 0,
        description: format!("Extension FD 0x{code:02X}"),
    })
}

/// Looks up a code of the 0xFB extension table. The extension bit is ignored.
pub fn lookup_vife_fb(code: u8) -> VifInfo {
    let code = code & 0x7F;
    lookup_range(VIFE_FB_CODES, code, VIF_TABLE_FB_OFFSET).unwrap_or_else(|| VifInfo {
        vif: VIF_TABLE_FB_OFFSET + u16::from(code),
        value_information: ValueInformation::ExtensionFb,
        unit: None,
        exponent: 0,
        description: format!("Extension FB 0x{code:02X}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_primary_code_resolves() {
        for code in 0u8..=0x7F {
            let info = lookup_primary_vif(code);
            assert_eq!(info.vif, u16::from(code));
            assert_ne!(info.value_information, ValueInformation::None);
        }
    }

    #[test]
    fn test_extension_bit_is_ignored() {
        assert_eq!(lookup_primary_vif(0x86), lookup_primary_vif(0x06));
    }

    #[test]
    fn test_energy_exponents() {
        let kwh = lookup_primary_vif(0x06);
        assert_eq!(kwh.value_information, ValueInformation::EnergyWh);
        assert_eq!(kwh.unit, Some(Unit::Kwh));
        assert_eq!(kwh.exponent, 0);
        assert_eq!(kwh.description, "Energy kWh");

        let wh = lookup_primary_vif(0x03);
        assert_eq!(wh.exponent, -3);
        assert_eq!(wh.description, "Energy Wh");

        let mj = lookup_primary_vif(0x0E);
        assert_eq!(mj.value_information, ValueInformation::EnergyMJ);
        assert_eq!(mj.unit, Some(Unit::Mj));
        assert_eq!(mj.exponent, 0);
    }

    #[test]
    fn test_volume_and_power_exponents() {
        let vol = lookup_primary_vif(0x14);
        assert_eq!(vol.value_information, ValueInformation::Volume);
        assert_eq!(vol.exponent, -2);
        assert_eq!(vol.description, "Volume 10^-2 m³");

        let pow = lookup_primary_vif(0x2D);
        assert_eq!(pow.value_information, ValueInformation::PowerW);
        assert_eq!(pow.unit, Some(Unit::Kw));
        assert_eq!(pow.exponent, -1);
        assert_eq!(pow.description, "Power 10^2 W");
    }

    #[test]
    fn test_durations_pick_time_unit() {
        assert_eq!(lookup_primary_vif(0x22).unit, Some(Unit::Hour));
        assert_eq!(lookup_primary_vif(0x27).unit, Some(Unit::Day));
        assert_eq!(
            lookup_primary_vif(0x74).value_information,
            ValueInformation::ActualityDuration
        );
    }

    #[test]
    fn test_extension_tables() {
        let access = lookup_vife_fd(0x08);
        assert_eq!(access.vif, 0x108);
        assert_eq!(access.value_information, ValueInformation::AccessNumber);

        let volts = lookup_vife_fd(0x49);
        assert_eq!(volts.value_information, ValueInformation::Voltage);
        assert_eq!(volts.exponent, 0);

        assert_eq!(lookup_vife_fd(0x7E).value_information, ValueInformation::ExtensionFd);

        let mwh = lookup_vife_fb(0x01);
        assert_eq!(mwh.value_information, ValueInformation::EnergyWh);
        assert_eq!(mwh.exponent, 3);
        assert_eq!(lookup_vife_fb(0x40).value_information, ValueInformation::ExtensionFb);
    }
}
