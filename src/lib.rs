//! # wmbus-dv - Data record decoding for wM-Bus meters
//!
//! wmbus-dv turns the decrypted application layer of a wireless M-Bus
//! telegram into named, unit-aware meter readings.
//!
//! ## Features
//!
//! - Scan the DIF/DIFE/VIF/VIFE data records of a telegram into keyed records
//! - Decode integer, BCD, real, date and text payloads
//! - Look records up by measurement type, value kind, storage and tariff
//! - Convert energy, power, volume, flow and time values between units
//! - Meter drivers with sticky fields and a JSON rendering of each reading
//! - Byte-level explanations of every decoded telegram
//!
//! ## Usage
//!
//! ```rust
//! use wmbus_dv::{create_meter, MeterInfo, OutputUnits, Telegram, Unit};
//!
//! let bytes = wmbus_dv::util::hex::decode_hex("03062C0000 022D1300").unwrap();
//! let mut telegram = Telegram::parse(bytes).unwrap();
//!
//! let mut meter = create_meter(MeterInfo::new("heat", "sharky775", "68926025")).unwrap();
//! meter.handle_telegram(&mut telegram);
//!
//! let units: OutputUnits = [Unit::Mj].into_iter().collect();
//! let reading = meter.render(&units).unwrap();
//! assert!((reading.number("total_energy_consumption").unwrap() - 158.4).abs() < 1e-9);
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod meters;
pub mod payload;
pub mod telegram;
pub mod units;
pub mod util;

pub use crate::config::{Config, MeterInfo, OutputUnits};
pub use crate::error::DvError;
pub use crate::logging::{init_logger, log_info};
pub use crate::telegram::Telegram;
pub use crate::units::{assert_quantity, convert, Quantity, Unit};

// Record scanning and lookup
pub use payload::{
    find_key, require_key, scan, DataEncoding, DvRecords, DvValue, MeasurementType,
    RecordDescriptor, Selector, ValueInformation,
};

// Drivers
pub use meters::{
    create_meter, lookup_driver, registered_drivers, EllSecurityMode, LinkMode, Meter, Reading,
};
