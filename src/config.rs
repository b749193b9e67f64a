//! Meter configuration and output unit preferences.
//!
//! Configuration is plain JSON:
//!
//! ```json
//! {
//!   "meters": [
//!     { "name": "heat", "driver": "sharky775", "id": "68926025" }
//!   ],
//!   "units": ["mj", "l"]
//! }
//! ```

use crate::error::DvError;
use crate::units::{Quantity, Unit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Identity of one configured meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterInfo {
    pub name: String,
    pub driver: String,
    pub id: String,
    /// Decryption key; only used by the link layer, never by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MeterInfo {
    pub fn new(name: impl Into<String>, driver: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            id: id.into(),
            key: None,
        }
    }
}

/// Preferred output unit per quantity; quantities without a preference use
/// their native unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputUnits {
    preferred: HashMap<Quantity, Unit>,
}

impl OutputUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefers `unit` for its quantity, replacing an earlier preference.
    pub fn prefer(&mut self, unit: Unit) -> &mut Self {
        self.preferred.insert(unit.quantity(), unit);
        self
    }

    pub fn unit_for(&self, quantity: Quantity) -> Option<Unit> {
        self.preferred
            .get(&quantity)
            .copied()
            .or_else(|| quantity.default_unit())
    }
}

impl FromIterator<Unit> for OutputUnits {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        let mut units = OutputUnits::new();
        for unit in iter {
            units.prefer(unit);
        }
        units
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub meters: Vec<MeterInfo>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, DvError> {
        serde_json::from_str(text).map_err(|e| DvError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, DvError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DvError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn output_units(&self) -> OutputUnits {
        self.units.iter().copied().collect()
    }

    pub fn meter(&self, name: &str) -> Option<&MeterInfo> {
        self.meters.iter().find(|m| m.name == name)
    }
}
