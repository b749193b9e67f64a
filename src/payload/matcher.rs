//! Selector lookup over scanned records.

use crate::error::DvError;
use crate::payload::dif::MeasurementType;
use crate::payload::record::{DvRecords, RecordDescriptor};
use crate::payload::vif::ValueInformation;

/// Semantic query for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    /// `MeasurementType::Unknown` matches any function.
    pub measurement_type: MeasurementType,
    pub value_information: ValueInformation,
    pub storage_number: u32,
    pub tariff: u32,
}

impl Selector {
    pub fn new(
        measurement_type: MeasurementType,
        value_information: ValueInformation,
        storage_number: u32,
        tariff: u32,
    ) -> Self {
        Self {
            measurement_type,
            value_information,
            storage_number,
            tariff,
        }
    }

    pub fn matches(&self, record: &RecordDescriptor) -> bool {
        (self.measurement_type == MeasurementType::Unknown
            || record.measurement_type == self.measurement_type)
            && record.value_information == self.value_information
            && record.storage_number == self.storage_number
            && record.tariff == self.tariff
    }
}

/// Finds the key of the first record, in byte order, matching the selector.
pub fn find_key<'a>(
    measurement_type: MeasurementType,
    value_information: ValueInformation,
    storage_number: u32,
    tariff: u32,
    records: &'a DvRecords,
) -> Option<&'a str> {
    let selector = Selector::new(measurement_type, value_information, storage_number, tariff);
    records
        .iter()
        .find(|r| selector.matches(r))
        .map(|r| r.key.as_str())
}

/// Like [`find_key`] but reports a miss as `KeyNotFound`.
pub fn require_key<'a>(selector: &Selector, records: &'a DvRecords) -> Result<&'a str, DvError> {
    find_key(
        selector.measurement_type,
        selector.value_information,
        selector.storage_number,
        selector.tariff,
        records,
    )
    .ok_or_else(|| DvError::KeyNotFound(format!("{selector:?}")))
}
