//! The payload module contains the components responsible for walking and
//! decoding the DIF/VIF data records of a telegram.

pub mod cursor;
pub mod data_encoding;
pub mod dif;
pub mod matcher;
pub mod record;
pub mod vif;
pub mod vif_maps;

pub use data_encoding::{decode_value, DvValue};
pub use dif::{DataEncoding, MeasurementType};
pub use matcher::{find_key, require_key, Selector};
pub use record::{scan, ByteSpan, DvRecords, Explanation, RecordDescriptor};
pub use vif::{ValueInformation, VifInfo, VifeModifier};
