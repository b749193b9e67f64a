//! Meter Drivers
//!
//! Each supported meter family is one variant of [`Meter`]. A driver owns a
//! state struct that `process_content` updates from each telegram, and a
//! static table of [`FieldPrint`]s describing the named fields it exposes.
//!
//! Fields are sticky: a telegram that lacks a record leaves the previous
//! value in place, so a value may be older than the last telegram.

pub mod sharky775;

pub use sharky775::Sharky775;

use crate::config::{MeterInfo, OutputUnits};
use crate::error::DvError;
use crate::logging::log_warn;
use crate::telegram::Telegram;
use crate::units::{Quantity, Unit};
use chrono::{DateTime, Utc};
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Radio link modes a meter transmits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    T1,
    C1,
    S1,
}

/// Extended link layer security expected by the link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EllSecurityMode {
    None,
    AesCtr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterType {
    HeatMeter,
}

impl MeterType {
    pub fn media(&self) -> &'static str {
        match self {
            MeterType::HeatMeter => "heat",
        }
    }
}

/// Static description of a driver.
#[derive(Debug)]
pub struct DriverInfo {
    pub name: &'static str,
    pub meter_type: MeterType,
    pub link_modes: &'static [LinkMode],
    pub security_mode: EllSecurityMode,
    create: fn(MeterInfo) -> Meter,
}

static DRIVERS: Lazy<HashMap<&'static str, &'static DriverInfo>> = Lazy::new(|| {
    let mut drivers = HashMap::new();
    for driver in [&sharky775::DRIVER] {
        drivers.insert(driver.name, driver);
    }
    drivers
});

/// Looks up a driver by name (case-insensitive).
pub fn lookup_driver(name: &str) -> Option<&'static DriverInfo> {
    DRIVERS.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Names of all registered drivers, sorted.
pub fn registered_drivers() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = DRIVERS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Creates a meter for the driver named in `info`.
pub fn create_meter(info: MeterInfo) -> Result<Meter, DvError> {
    let driver = lookup_driver(&info.driver).ok_or_else(|| DvError::UnknownDriver(info.driver.clone()))?;
    debug!("creating {} meter '{}' id {}", driver.name, info.name, info.id);
    Ok((driver.create)(info))
}

/// How a field is read out of a driver's state.
pub enum Extract<S> {
    Numeric(fn(&S, Unit) -> Result<f64, DvError>),
    Text(fn(&S) -> String),
}

/// One named output field of a driver.
pub struct FieldPrint<S> {
    pub name: &'static str,
    pub quantity: Quantity,
    pub extract: Extract<S>,
    pub description: &'static str,
    /// Shown in the compact field listing.
    pub in_fields: bool,
    /// Included in JSON output.
    pub in_json: bool,
}

/// A rendered field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldData {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub name: String,
    pub quantity: Quantity,
    pub unit: Option<Unit>,
    pub value: FieldData,
    pub in_fields: bool,
    pub in_json: bool,
}

impl FieldValue {
    /// JSON key, e.g. `total_energy_consumption_kwh`.
    pub fn json_name(&self) -> String {
        match self.unit {
            Some(unit) => format!("{}_{}", self.name, unit.name()),
            None => self.name.clone(),
        }
    }
}

/// Snapshot of a meter's fields in the requested units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub media: &'static str,
    pub meter: &'static str,
    pub name: String,
    pub id: String,
    pub fields: Vec<FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.field(name)?.value {
            FieldData::Number(v) => Some(v),
            FieldData::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match &self.field(name)?.value {
            FieldData::Text(s) => Some(s),
            FieldData::Number(_) => None,
        }
    }

    /// Flat JSON object in the `name_unit` style.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("media".into(), json!(self.media));
        object.insert("meter".into(), json!(self.meter));
        object.insert("name".into(), json!(self.name));
        object.insert("id".into(), json!(self.id));
        for field in self.fields.iter().filter(|f| f.in_json) {
            let value = match &field.value {
                FieldData::Number(v) => json!(v),
                FieldData::Text(s) => json!(s),
            };
            object.insert(field.json_name(), value);
        }
        object.insert("timestamp".into(), json!(self.timestamp.to_rfc3339()));
        Value::Object(object)
    }
}

/// Evaluates a print table against a driver state.
pub fn render_prints<S>(
    state: &S,
    prints: &[FieldPrint<S>],
    units: &OutputUnits,
) -> Result<Vec<FieldValue>, DvError> {
    prints
        .iter()
        .map(|p| {
            let (unit, value) = match &p.extract {
                Extract::Numeric(f) => {
                    let unit = units.unit_for(p.quantity).ok_or_else(|| {
                        DvError::Config(format!("no unit for numeric field {}", p.name))
                    })?;
                    (Some(unit), FieldData::Number(f(state, unit)?))
                }
                Extract::Text(f) => (None, FieldData::Text(f(state))),
            };
            Ok(FieldValue {
                name: p.name.to_string(),
                quantity: p.quantity,
                unit,
                value,
                in_fields: p.in_fields,
                in_json: p.in_json,
            })
        })
        .collect()
}

/// Stores an extraction result into a sticky field.
///
/// A missing key leaves `target` untouched. A decode failure is logged and
/// also leaves `target` untouched. On success the value is stored and
/// `describe` is appended to the telegram's explanation at the payload.
pub(crate) fn update_sticky<T>(
    t: &mut Telegram,
    key: &str,
    result: Result<(usize, T), DvError>,
    target: &mut T,
    what: &str,
    describe: impl FnOnce(&T) -> String,
) {
    match result {
        Ok((offset, value)) => {
            *target = value;
            t.add_more_explanation(offset, format!(" {what} ({})", describe(target)));
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => log_warn(&format!("{what}: could not decode record {key}: {e}")),
    }
}

/// A configured meter of one of the supported families.
#[derive(Debug, Clone)]
pub enum Meter {
    Sharky775(Sharky775),
}

impl Meter {
    pub fn info(&self) -> &MeterInfo {
        match self {
            Meter::Sharky775(m) => &m.info,
        }
    }

    pub fn driver(&self) -> &'static DriverInfo {
        match self {
            Meter::Sharky775(_) => &sharky775::DRIVER,
        }
    }

    /// Number of telegrams processed so far.
    pub fn num_updates(&self) -> usize {
        match self {
            Meter::Sharky775(m) => m.num_updates,
        }
    }

    /// Updates the meter's fields from an already scanned telegram.
    pub fn handle_telegram(&mut self, t: &mut Telegram) {
        match self {
            Meter::Sharky775(m) => {
                sharky775::process_content(&mut m.state, t);
                m.num_updates += 1;
            }
        }
        debug!("meter '{}' updated ({} telegrams)", self.info().name, self.num_updates());
    }

    /// Renders all fields in the preferred units.
    pub fn render(&self, units: &OutputUnits) -> Result<Reading, DvError> {
        let fields = match self {
            Meter::Sharky775(m) => render_prints(&m.state, &sharky775::PRINTS, units)?,
        };
        let info = self.info();
        let driver = self.driver();
        Ok(Reading {
            media: driver.meter_type.media(),
            meter: driver.name,
            name: info.name.clone(),
            id: info.id.clone(),
            fields,
            timestamp: Utc::now(),
        })
    }
}
