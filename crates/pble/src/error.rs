//! Error types for the BLE abstraction layer

use thiserror::Error;

use crate::stack::StackError;

// ----------------------------------------------------------------------------
// Status Codes
// ----------------------------------------------------------------------------

/// errno values used for the status codes reported by [`BleError::code`]
pub mod errno {
    pub const EAGAIN: i32 = 11;
    pub const EFAULT: i32 = 14;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const ENOLINK: i32 = 67;
    pub const EMSGSIZE: i32 = 90;
    pub const EADDRNOTAVAIL: i32 = 99;
    pub const ENETDOWN: i32 = 100;
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors reported by a [`BleDevice`](crate::BleDevice)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BleError {
    #[error("Radio stack not enabled")]
    NotReady,

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Radio stack not ready: {code}")]
    LinkUnavailable { code: StackError },

    #[error("BLE start failure, check RAM start address {ram_start:#x}: {code}")]
    AddressUnavailable { ram_start: u32, code: StackError },

    #[error("Failed to {operation}: {code}")]
    Retry {
        operation: &'static str,
        code: StackError,
    },

    #[error("Failed to {operation}: {code}")]
    NetworkDown {
        operation: &'static str,
        code: StackError,
    },

    #[error("Payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: usize, max_size: usize },

    #[error("Radio fault: {reason}")]
    Fault { reason: String },
}

impl BleError {
    /// Negative errno-style status code for this error
    pub fn code(&self) -> i32 {
        -match self {
            Self::NotReady => errno::ENODEV,
            Self::InvalidConfiguration { .. } => errno::EINVAL,
            Self::LinkUnavailable { .. } => errno::ENOLINK,
            Self::AddressUnavailable { .. } => errno::EADDRNOTAVAIL,
            Self::Retry { .. } => errno::EAGAIN,
            Self::NetworkDown { .. } => errno::ENETDOWN,
            Self::PayloadTooLarge { .. } => errno::EMSGSIZE,
            Self::Fault { .. } => errno::EFAULT,
        }
    }

    /// The vendor return code behind this error, if the stack produced it
    pub fn stack_error(&self) -> Option<StackError> {
        match self {
            Self::LinkUnavailable { code }
            | Self::AddressUnavailable { code, .. }
            | Self::Retry { code, .. }
            | Self::NetworkDown { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Result type used throughout the crate
pub type BleResult<T> = core::result::Result<T, BleError>;

/// Collapse a result into a status code, `0` on success
pub fn status_code<T>(result: &BleResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.code(),
    }
}
