//! DV Record Constants
//!
//! This module defines bit masks and reserved codes used when walking the
//! data record layer of M-Bus / wM-Bus telegrams, based on EN 13757-3.

/// DIF (Data Information Field) mask for data length / type
pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;

/// DIF mask for function
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;

/// DIF mask for storage number
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;

/// DIFE (Data Information Field Extension) mask for storage number
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x0F;

/// DIFE mask for tariff
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;

/// DIFE mask for device (subunit)
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

/// DIF idle filler
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;

/// DIF manufacturer specific
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;

/// DIF more records follow
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

/// DIF global readout request
pub const MBUS_DIB_DIF_GLOBAL_READOUT: u8 = 0x7F;

/// DIF extension bit
pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;

/// VIF without extension
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// VIF extension bit
pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;

/// VIF selecting the second extension table (0xFB with extension bit)
pub const MBUS_DIB_VIF_EXTENSION_FB: u8 = 0x7B;

/// VIF announcing a plain text unit
pub const MBUS_DIB_VIF_PLAIN_TEXT: u8 = 0x7C;

/// VIF selecting the first extension table (0xFD with extension bit)
pub const MBUS_DIB_VIF_EXTENSION_FD: u8 = 0x7D;

/// VIF manufacturer specific; following VIFEs are in the vendor namespace
pub const MBUS_DIB_VIF_MANUFACTURER_SPECIFIC: u8 = 0x7F;

/// Combinable VIFE switching the rest of the chain to the vendor namespace
pub const MBUS_DIB_VIFE_MANUFACTURER_SPECIFIC: u8 = 0x7F;

/// Maximum number of DIFE bytes following a DIF
pub const MBUS_MAX_DIFE: usize = 10;

/// Maximum number of VIFE bytes following a VIF
pub const MBUS_MAX_VIFE: usize = 10;

/// Custom VIF size
pub const MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE: u8 = 16;

/// Offset added to codes of the 0xFD extension table
pub const VIF_TABLE_FD_OFFSET: u16 = 0x100;

/// Offset added to codes of the 0xFB extension table
pub const VIF_TABLE_FB_OFFSET: u16 = 0x200;
