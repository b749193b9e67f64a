//! # Units and Quantities
//!
//! Physical quantities reported by meters and the units each of them can be
//! presented in. Every unit carries a linear scale factor relative to the
//! native unit of its quantity; there are no offset terms.

use crate::error::DvError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical quantity (or a non-numeric field kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Energy,
    Power,
    Volume,
    Flow,
    Temperature,
    Pressure,
    Time,
    Text,
    Date,
}

/// A unit of measurement. Each unit belongs to exactly one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kwh,
    Wh,
    Mj,
    Gj,
    Kw,
    W,
    M3,
    L,
    M3h,
    Lh,
    C,
    Bar,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "d")]
    Day,
}

/// (unit, quantity, native units per one of this unit, suffix, parse name)
const UNIT_CATALOG: &[(Unit, Quantity, f64, &str, &str)] = &[
    (Unit::Kwh, Quantity::Energy, 1.0, "kWh", "kwh"),
    (Unit::Wh, Quantity::Energy, 0.001, "Wh", "wh"),
    (Unit::Mj, Quantity::Energy, 1.0 / 3.6, "MJ", "mj"),
    (Unit::Gj, Quantity::Energy, 1000.0 / 3.6, "GJ", "gj"),
    (Unit::Kw, Quantity::Power, 1.0, "kW", "kw"),
    (Unit::W, Quantity::Power, 0.001, "W", "w"),
    (Unit::M3, Quantity::Volume, 1.0, "m3", "m3"),
    (Unit::L, Quantity::Volume, 0.001, "l", "l"),
    (Unit::M3h, Quantity::Flow, 1.0, "m3/h", "m3h"),
    (Unit::Lh, Quantity::Flow, 0.001, "l/h", "lh"),
    (Unit::C, Quantity::Temperature, 1.0, "°C", "c"),
    (Unit::Bar, Quantity::Pressure, 1.0, "bar", "bar"),
    (Unit::Hour, Quantity::Time, 1.0, "h", "h"),
    (Unit::Second, Quantity::Time, 1.0 / 3600.0, "s", "s"),
    (Unit::Minute, Quantity::Time, 1.0 / 60.0, "min", "min"),
    (Unit::Day, Quantity::Time, 24.0, "d", "d"),
];

fn catalog_entry(unit: Unit) -> &'static (Unit, Quantity, f64, &'static str, &'static str) {
    // The catalog lists every variant, so the lookup cannot miss.
    UNIT_CATALOG
        .iter()
        .find(|(u, _, _, _, _)| *u == unit)
        .unwrap_or(&UNIT_CATALOG[0])
}

impl Unit {
    /// All known units, in catalog order.
    pub fn all() -> impl Iterator<Item = Unit> {
        UNIT_CATALOG.iter().map(|(u, _, _, _, _)| *u)
    }

    /// The quantity this unit measures.
    pub fn quantity(self) -> Quantity {
        catalog_entry(self).1
    }

    /// How many native units of the quantity one of this unit is.
    pub fn scale(self) -> f64 {
        catalog_entry(self).2
    }

    /// Human readable suffix, e.g. `kWh`.
    pub fn suffix(self) -> &'static str {
        catalog_entry(self).3
    }

    /// Lowercase name used in field names and on the command line, e.g. `kwh`.
    pub fn name(self) -> &'static str {
        catalog_entry(self).4
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Unit {
    type Err = DvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        UNIT_CATALOG
            .iter()
            .find(|(_, _, _, _, name)| *name == wanted)
            .map(|(u, _, _, _, _)| *u)
            .ok_or_else(|| DvError::InvalidUnit(s.to_string()))
    }
}

impl Quantity {
    /// The native unit values of this quantity are stored in.
    /// Text and Date have none.
    pub fn default_unit(self) -> Option<Unit> {
        match self {
            Quantity::Energy => Some(Unit::Kwh),
            Quantity::Power => Some(Unit::Kw),
            Quantity::Volume => Some(Unit::M3),
            Quantity::Flow => Some(Unit::M3h),
            Quantity::Temperature => Some(Unit::C),
            Quantity::Pressure => Some(Unit::Bar),
            Quantity::Time => Some(Unit::Hour),
            Quantity::Text | Quantity::Date => None,
        }
    }

    /// Units that values of this quantity can be converted into.
    pub fn units(self) -> Vec<Unit> {
        Unit::all().filter(|u| u.quantity() == self).collect()
    }
}

impl FromStr for Quantity {
    type Err = DvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "energy" => Ok(Quantity::Energy),
            "power" => Ok(Quantity::Power),
            "volume" => Ok(Quantity::Volume),
            "flow" => Ok(Quantity::Flow),
            "temperature" => Ok(Quantity::Temperature),
            "pressure" => Ok(Quantity::Pressure),
            "time" => Ok(Quantity::Time),
            "text" => Ok(Quantity::Text),
            "date" => Ok(Quantity::Date),
            _ => Err(DvError::Config(format!("unknown quantity '{s}'"))),
        }
    }
}

/// Fails with `QuantityMismatch` if `unit` does not measure `expected`.
pub fn assert_quantity(unit: Unit, expected: Quantity) -> Result<(), DvError> {
    if unit.quantity() == expected {
        Ok(())
    } else {
        Err(DvError::QuantityMismatch { unit, expected })
    }
}

/// Converts `value` from one unit to another of the same quantity.
///
/// Converting a unit to itself returns the value unchanged. Units of
/// different quantities are never coerced.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, DvError> {
    if from == to {
        return Ok(value);
    }
    assert_quantity(to, from.quantity())?;
    Ok(value * from.scale() / to.scale())
}
