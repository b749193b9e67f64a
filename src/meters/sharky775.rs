//! Diehl Sharky 775 heat meter.
//!
//! A typical decrypted telegram carries these records:
//!
//! ```text
//! 03 06 2C0000   total energy, kWh
//! 43 06 000000   energy at the billing date (storage 1)
//! 03 14 630000   total volume, 10^-2 m3
//! 42 6C 7F2A     billing date (storage 1)
//! 02 2D 1300     current power, 10^2 W
//! 01 FF21 00     info codes
//! ```

use super::{
    update_sticky, DriverInfo, EllSecurityMode, Extract, FieldPrint, LinkMode, Meter, MeterType,
};
use crate::config::MeterInfo;
use crate::error::DvError;
use crate::payload::dif::MeasurementType;
use crate::payload::matcher::find_key;
use crate::payload::vif::ValueInformation;
use crate::telegram::Telegram;
use crate::units::{assert_quantity, convert, Quantity, Unit};

pub static DRIVER: DriverInfo = DriverInfo {
    name: "sharky775",
    meter_type: MeterType::HeatMeter,
    link_modes: &[LinkMode::T1],
    security_mode: EllSecurityMode::AesCtr,
    create,
};

fn create(info: MeterInfo) -> Meter {
    Meter::Sharky775(Sharky775::new(info))
}

const INFO_CODES_KEY: &str = "01FF21";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sharky775State {
    pub info_codes: u8,
    pub total_energy_kwh: f64,
    pub target_energy_kwh: f64,
    pub current_power_kw: f64,
    pub total_volume_m3: f64,
    pub target_date: String,
}

impl Sharky775State {
    pub fn total_energy_consumption(&self, unit: Unit) -> Result<f64, DvError> {
        assert_quantity(unit, Quantity::Energy)?;
        convert(self.total_energy_kwh, Unit::Kwh, unit)
    }

    pub fn target_energy_consumption(&self, unit: Unit) -> Result<f64, DvError> {
        assert_quantity(unit, Quantity::Energy)?;
        convert(self.target_energy_kwh, Unit::Kwh, unit)
    }

    pub fn current_power_consumption(&self, unit: Unit) -> Result<f64, DvError> {
        assert_quantity(unit, Quantity::Power)?;
        convert(self.current_power_kw, Unit::Kw, unit)
    }

    pub fn total_volume(&self, unit: Unit) -> Result<f64, DvError> {
        assert_quantity(unit, Quantity::Volume)?;
        convert(self.total_volume_m3, Unit::M3, unit)
    }

    pub fn target_date(&self) -> String {
        self.target_date.clone()
    }

    /// Status text derived from the info codes.
    pub fn status(&self) -> String {
        // TODO: map Sharky 775 info code bits to text once the vendor bit
        // assignments are confirmed.
        String::new()
    }
}

/// A configured Sharky 775 meter.
#[derive(Debug, Clone)]
pub struct Sharky775 {
    pub info: MeterInfo,
    pub state: Sharky775State,
    pub(crate) num_updates: usize,
}

impl Sharky775 {
    pub fn new(info: MeterInfo) -> Self {
        Self {
            info,
            state: Sharky775State::default(),
            num_updates: 0,
        }
    }
}

pub static PRINTS: [FieldPrint<Sharky775State>; 6] = [
    FieldPrint {
        name: "total_energy_consumption",
        quantity: Quantity::Energy,
        extract: Extract::Numeric(Sharky775State::total_energy_consumption),
        description: "The total energy consumption recorded by this meter.",
        in_fields: true,
        in_json: true,
    },
    FieldPrint {
        name: "current_power_consumption",
        quantity: Quantity::Power,
        extract: Extract::Numeric(Sharky775State::current_power_consumption),
        description: "Current power consumption.",
        in_fields: true,
        in_json: true,
    },
    FieldPrint {
        name: "total_volume",
        quantity: Quantity::Volume,
        extract: Extract::Numeric(Sharky775State::total_volume),
        description: "Total volume of heat media.",
        in_fields: true,
        in_json: true,
    },
    FieldPrint {
        name: "at_date",
        quantity: Quantity::Text,
        extract: Extract::Text(Sharky775State::target_date),
        description: "Date when total energy consumption was recorded.",
        in_fields: false,
        in_json: true,
    },
    FieldPrint {
        name: "total_energy_consumption_at_date",
        quantity: Quantity::Energy,
        extract: Extract::Numeric(Sharky775State::target_energy_consumption),
        description: "The total energy consumption recorded at the target date.",
        in_fields: false,
        in_json: true,
    },
    FieldPrint {
        name: "current_status",
        quantity: Quantity::Text,
        extract: Extract::Text(Sharky775State::status),
        description: "Status of meter.",
        in_fields: true,
        in_json: true,
    },
];

fn update_double(
    t: &mut Telegram,
    value_information: ValueInformation,
    storage_number: u32,
    unit: Unit,
    target: &mut f64,
    what: &str,
) {
    let key = match find_key(
        MeasurementType::Instantaneous,
        value_information,
        storage_number,
        0,
        t.records(),
    ) {
        Some(key) => key.to_string(),
        None => return,
    };
    let result = t.extract_double_in(&key, unit);
    update_sticky(t, &key, result, target, what, |v| format!("{v:.6} {}", unit.suffix()));
}

/// Updates `state` from the records of one telegram.
pub fn process_content(state: &mut Sharky775State, t: &mut Telegram) {
    let result = t.extract_u8(INFO_CODES_KEY);
    update_sticky(t, INFO_CODES_KEY, result, &mut state.info_codes, "info codes", |c| {
        format!("{c:02X}")
    });

    update_double(
        t,
        ValueInformation::EnergyWh,
        0,
        Unit::Kwh,
        &mut state.total_energy_kwh,
        "total energy consumption",
    );
    update_double(
        t,
        ValueInformation::Volume,
        0,
        Unit::M3,
        &mut state.total_volume_m3,
        "total volume",
    );
    update_double(
        t,
        ValueInformation::EnergyWh,
        1,
        Unit::Kwh,
        &mut state.target_energy_kwh,
        "target energy consumption",
    );
    update_double(
        t,
        ValueInformation::PowerW,
        0,
        Unit::Kw,
        &mut state.current_power_kw,
        "current power consumption",
    );

    if let Some(key) =
        find_key(MeasurementType::Unknown, ValueInformation::Date, 1, 0, t.records()).map(str::to_string)
    {
        // A date flagged as not set keeps the previous one.
        let result = t.extract_date(&key).and_then(|(offset, date)| match date {
            Some(d) => Ok((offset, d.format("%Y-%m-%d 00:00").to_string())),
            None => Err(DvError::KeyNotFound(key.clone())),
        });
        update_sticky(t, &key, result, &mut state.target_date, "target date", |d| d.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram(bytes: &[u8]) -> Telegram {
        Telegram::parse(bytes.to_vec()).unwrap()
    }

    fn full() -> Vec<u8> {
        vec![
            0x03, 0x06, 0x2C, 0x00, 0x00, // total energy
            0x43, 0x06, 0x00, 0x00, 0x00, // target energy
            0x03, 0x14, 0x63, 0x00, 0x00, // total volume
            0x42, 0x6C, 0x7F, 0x2A, // target date
            0x02, 0x2D, 0x13, 0x00, // power
            0x01, 0xFF, 0x21, 0x00, // info codes
        ]
    }

    #[test]
    fn test_process_full_telegram() {
        let mut state = Sharky775State::default();
        let mut t = telegram(&full());
        process_content(&mut state, &mut t);

        assert!((state.total_energy_kwh - 44.0).abs() < 1e-9);
        assert!((state.target_energy_kwh - 0.0).abs() < 1e-9);
        assert!((state.total_volume_m3 - 0.99).abs() < 1e-9);
        assert!((state.current_power_kw - 1.9).abs() < 1e-9);
        assert_eq!(state.target_date, "2019-10-31 00:00");
        assert_eq!(state.info_codes, 0);

        let text = t.analyse();
        assert!(text.contains("total energy consumption (44.000000 kWh)"), "{text}");
        assert!(text.contains("target date (2019-10-31 00:00)"), "{text}");
        assert!(text.contains("info codes (00)"), "{text}");
    }

    #[test]
    fn test_accessors_convert() {
        let state = Sharky775State {
            total_energy_kwh: 44.0,
            total_volume_m3: 0.99,
            ..Default::default()
        };
        assert!((state.total_energy_consumption(Unit::Mj).unwrap() - 158.4).abs() < 1e-9);
        assert!((state.total_volume(Unit::L).unwrap() - 990.0).abs() < 1e-9);
        assert!(matches!(
            state.total_volume(Unit::Kwh),
            Err(DvError::QuantityMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_records_are_sticky() {
        let mut state = Sharky775State::default();
        process_content(&mut state, &mut telegram(&full()));

        // Only a new energy reading.
        process_content(&mut state, &mut telegram(&[0x03, 0x06, 0x2D, 0x00, 0x00]));
        assert!((state.total_energy_kwh - 45.0).abs() < 1e-9);
        assert!((state.total_volume_m3 - 0.99).abs() < 1e-9);
        assert_eq!(state.target_date, "2019-10-31 00:00");
    }

    #[test]
    fn test_unset_date_is_sticky() {
        let mut state = Sharky775State {
            target_date: "2019-10-31 00:00".to_string(),
            ..Default::default()
        };
        // Invalid bit set in the date.
        process_content(&mut state, &mut telegram(&[0x42, 0x6C, 0xFF, 0xFF]));
        assert_eq!(state.target_date, "2019-10-31 00:00");
    }

    #[test]
    fn test_prints_table() {
        let names: Vec<&str> = PRINTS.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "total_energy_consumption",
                "current_power_consumption",
                "total_volume",
                "at_date",
                "total_energy_consumption_at_date",
                "current_status",
            ]
        );
        assert!(!PRINTS[3].in_fields && PRINTS[3].in_json);
    }
}
