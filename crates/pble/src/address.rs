//! Device addresses and the address/privacy mapping

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BleError;
use crate::stack::{GapAddr, GapAddrType, PrivacyParams};

/// Length of a BLE device address
pub const ADDR_LEN: usize = 6;

// ----------------------------------------------------------------------------
// Address Types
// ----------------------------------------------------------------------------

/// Address scheme used to identify the local device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    Public,
    /// Resolvable private address, rotated by the stack
    ResolvablePrivate,
    /// Non-resolvable private address
    NonResolvablePrivate,
    StaticRandom,
}

impl AddressType {
    /// The stack's address type code for this scheme
    pub fn gap_addr_type(self) -> GapAddrType {
        match self {
            Self::Public => GapAddrType::Public,
            Self::ResolvablePrivate => GapAddrType::RandomPrivateResolvable,
            Self::NonResolvablePrivate => GapAddrType::RandomPrivateNonResolvable,
            Self::StaticRandom => GapAddrType::RandomStatic,
        }
    }

    /// Privacy configuration submitted to the stack during bring-up
    pub fn privacy_params(self, private_addr_cycle_s: u16) -> PrivacyParams {
        PrivacyParams {
            private_addr_type: self.gap_addr_type(),
            private_addr_cycle_s,
            device_irk: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Device Address
// ----------------------------------------------------------------------------

/// 48-bit device address, stored least significant byte first
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceAddress([u8; ADDR_LEN]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDR_LEN]
    }

    /// The stack's typed form of this address
    pub fn to_gap_addr(self, addr_type: AddressType) -> GapAddr {
        GapAddr {
            addr_type: addr_type.gap_addr_type(),
            addr: self.0,
        }
    }
}

impl From<[u8; ADDR_LEN]> for DeviceAddress {
    fn from(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DeviceAddress {
    /// Most significant byte first, the way addresses are usually written
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceAddress({})", self)
    }
}

impl FromStr for DeviceAddress {
    type Err = BleError;

    /// Parse `AA:BB:CC:DD:EE:FF` (or without separators)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        let bytes = hex::decode(&digits).map_err(|e| {
            BleError::invalid_configuration(format!("invalid device address '{}': {}", s, e))
        })?;
        let mut msb_first: [u8; ADDR_LEN] = bytes.as_slice().try_into().map_err(|_| {
            BleError::invalid_configuration(format!(
                "invalid device address '{}': expected {} bytes",
                s, ADDR_LEN
            ))
        })?;
        msb_first.reverse();
        Ok(Self(msb_first))
    }
}
