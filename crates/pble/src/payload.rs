//! Advertising payload buffer

use crate::error::{BleError, BleResult};
use crate::stack::ADV_SET_DATA_SIZE_MAX;

// ----------------------------------------------------------------------------
// AD Types
// ----------------------------------------------------------------------------

/// Common AD structure type codes
pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const INCOMPLETE_16BIT_UUIDS: u8 = 0x02;
    pub const COMPLETE_16BIT_UUIDS: u8 = 0x03;
    pub const COMPLETE_128BIT_UUIDS: u8 = 0x07;
    pub const SHORTENED_LOCAL_NAME: u8 = 0x08;
    pub const COMPLETE_LOCAL_NAME: u8 = 0x09;
    pub const TX_POWER_LEVEL: u8 = 0x0A;
    pub const SERVICE_DATA_16BIT: u8 = 0x16;
    pub const APPEARANCE: u8 = 0x19;
    pub const MANUFACTURER_SPECIFIC_DATA: u8 = 0xFF;
}

// ----------------------------------------------------------------------------
// Payload Buffer
// ----------------------------------------------------------------------------

/// Fixed-capacity advertising data buffer with a write cursor
///
/// Holds raw AD-structure bytes for either the advertising PDU or the scan
/// response. The cursor never exceeds [`AdvPayload::CAPACITY`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdvPayload {
    payload: [u8; ADV_SET_DATA_SIZE_MAX],
    index: usize,
}

impl AdvPayload {
    /// Legacy advertising PDU data limit
    pub const CAPACITY: usize = ADV_SET_DATA_SIZE_MAX;

    /// Create an empty payload
    pub const fn new() -> Self {
        Self {
            payload: [0; ADV_SET_DATA_SIZE_MAX],
            index: 0,
        }
    }

    /// Create a payload holding a copy of `bytes`
    pub fn from_slice(bytes: &[u8]) -> BleResult<Self> {
        let mut payload = Self::new();
        payload.extend_from_slice(bytes)?;
        Ok(payload)
    }

    /// Append raw bytes at the cursor
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> BleResult<()> {
        let end = self.index + bytes.len();
        if end > Self::CAPACITY {
            return Err(BleError::PayloadTooLarge {
                size: end,
                max_size: Self::CAPACITY,
            });
        }
        self.payload[self.index..end].copy_from_slice(bytes);
        self.index = end;
        Ok(())
    }

    /// Append one AD structure: length, type, then `data`
    pub fn push_ad_field(&mut self, ad_type: u8, data: &[u8]) -> BleResult<()> {
        let end = self.index + 2 + data.len();
        if end > Self::CAPACITY {
            return Err(BleError::PayloadTooLarge {
                size: end,
                max_size: Self::CAPACITY,
            });
        }
        // Length covers the type byte plus data; fits since end <= 31.
        self.payload[self.index] = (data.len() + 1) as u8;
        self.payload[self.index + 1] = ad_type;
        self.payload[self.index + 2..end].copy_from_slice(data);
        self.index = end;
        Ok(())
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload[..self.index]
    }

    /// Number of bytes written
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    /// Remaining room before the capacity is reached
    pub fn remaining(&self) -> usize {
        Self::CAPACITY - self.index
    }

    /// Reset the cursor and zero the buffer
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for AdvPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AdvPayload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdvPayload")
            .field("len", &self.index)
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}

impl AsRef<[u8]> for AdvPayload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for AdvPayload {
    type Error = BleError;

    fn try_from(bytes: &[u8]) -> BleResult<Self> {
        Self::from_slice(bytes)
    }
}
