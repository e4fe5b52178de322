//! Vendor radio stack boundary
//!
//! Everything the nRF52 backend needs from the SoftDevice is expressed through the
//! [`SoftDevice`] trait. Types in this module mirror the vendor's own parameter
//! structures and numeric codes, so they live under `stack::` rather than next to
//! the vendor-neutral API types of the same name.

pub mod sim;

use thiserror::Error;

use crate::payload::AdvPayload;

// ----------------------------------------------------------------------------
// Return Codes
// ----------------------------------------------------------------------------

/// Raw return code reported by the vendor stack
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("stack error {0:#x}")]
pub struct StackError(pub u32);

impl StackError {
    pub const INTERNAL: Self = Self(0x03);
    pub const NO_MEM: Self = Self(0x04);
    pub const INVALID_PARAM: Self = Self(0x07);
    pub const INVALID_STATE: Self = Self(0x08);
    pub const DATA_SIZE: Self = Self(0x0C);
    pub const BUSY: Self = Self(0x11);
    pub const INVALID_ADV_HANDLE: Self = Self(0x3004);

    /// The raw vendor code
    pub fn code(self) -> u32 {
        self.0
    }
}

/// Result of a vendor stack call
pub type StackResult<T> = core::result::Result<T, StackError>;

// ----------------------------------------------------------------------------
// Advertising Set Parameters
// ----------------------------------------------------------------------------

/// Advertising set handle value meaning "no set allocated yet"
pub const ADV_SET_HANDLE_NOT_SET: u8 = 0xFF;

/// Connection handle value meaning "no connection"
pub const CONN_HANDLE_INVALID: u16 = 0xFFFF;

/// Maximum legacy advertising data length accepted by the stack
pub const ADV_SET_DATA_SIZE_MAX: usize = 31;

/// Default private address rotation period, in seconds
pub const DEFAULT_PRIVATE_ADDR_CYCLE_INTERVAL_S: u16 = 900;

/// Advertising PDU type of an advertising set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdvType {
    ConnectableScannableUndirected = 0x01,
    ConnectableNonscannableDirectedHighDutyCycle = 0x02,
    ConnectableNonscannableDirected = 0x03,
    NonconnectableScannableUndirected = 0x04,
    NonconnectableNonscannableUndirected = 0x05,
}

impl AdvType {
    /// Whether a central may connect in response to this PDU type
    pub fn is_connectable(self) -> bool {
        matches!(
            self,
            Self::ConnectableScannableUndirected
                | Self::ConnectableNonscannableDirectedHighDutyCycle
                | Self::ConnectableNonscannableDirected
        )
    }

    /// Whether a scanner may send a scan request in response to this PDU type
    pub fn is_scannable(self) -> bool {
        matches!(
            self,
            Self::ConnectableScannableUndirected | Self::NonconnectableScannableUndirected
        )
    }

    /// Whether the PDU is addressed to a single peer
    pub fn is_directed(self) -> bool {
        matches!(
            self,
            Self::ConnectableNonscannableDirectedHighDutyCycle
                | Self::ConnectableNonscannableDirected
        )
    }
}

/// Parameters of one advertising set, in the stack's native units
///
/// Sets always advertise on the 1 Mbps PHY and accept scan and connect requests
/// from any peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvParams {
    pub adv_type: AdvType,
    /// Advertising interval in 0.625 ms units
    pub interval: u32,
    /// Advertising duration in 10 ms units, 0 meaning no timeout
    pub duration: u16,
    /// Peer address, required by directed types and ignored otherwise
    pub peer_addr: Option<GapAddr>,
}

impl Default for AdvParams {
    fn default() -> Self {
        Self {
            adv_type: AdvType::ConnectableScannableUndirected,
            interval: 0,
            duration: 0,
            peer_addr: None,
        }
    }
}

/// Encoded advertising and scan-response data handed to the stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvData {
    pub adv_data: AdvPayload,
    pub scan_rsp_data: AdvPayload,
}

// ----------------------------------------------------------------------------
// Identity and Privacy
// ----------------------------------------------------------------------------

/// GAP address type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GapAddrType {
    Public = 0x00,
    RandomStatic = 0x01,
    RandomPrivateResolvable = 0x02,
    RandomPrivateNonResolvable = 0x03,
}

/// A typed 48-bit GAP address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapAddr {
    pub addr_type: GapAddrType,
    pub addr: [u8; 6],
}

/// Parameters for the stack's privacy configuration
///
/// Submitted in device privacy mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyParams {
    pub private_addr_type: GapAddrType,
    pub private_addr_cycle_s: u16,
    /// Identity resolving key, `None` lets the stack use its own
    pub device_irk: Option<[u8; 16]>,
}

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

/// Vendor event identifiers
pub mod evt {
    pub const GAP_EVT_BASE: u16 = 0x10;
    pub const GAP_EVT_LAST: u16 = 0x2F;
    pub const GATTC_EVT_BASE: u16 = 0x30;
    pub const GATTC_EVT_LAST: u16 = 0x4F;
    pub const GATTS_EVT_BASE: u16 = 0x50;
    pub const GATTS_EVT_LAST: u16 = 0x6F;

    pub const GAP_CONNECTED: u16 = 0x10;
    pub const GAP_DISCONNECTED: u16 = 0x11;
    pub const GAP_CONN_PARAM_UPDATE: u16 = 0x12;
    pub const GAP_SEC_PARAMS_REQUEST: u16 = 0x13;
    pub const GAP_SEC_INFO_REQUEST: u16 = 0x14;
    pub const GAP_PASSKEY_DISPLAY: u16 = 0x15;
    pub const GAP_KEY_PRESSED: u16 = 0x16;
    pub const GAP_AUTH_KEY_REQUEST: u16 = 0x17;
    pub const GAP_LESC_DHKEY_REQUEST: u16 = 0x18;
    pub const GAP_AUTH_STATUS: u16 = 0x19;
    pub const GAP_CONN_SEC_UPDATE: u16 = 0x1A;
    pub const GAP_TIMEOUT: u16 = 0x1B;
    pub const GAP_SEC_REQUEST: u16 = 0x1E;
    pub const GAP_CONN_PARAM_UPDATE_REQUEST: u16 = 0x1F;
    pub const GAP_PHY_UPDATE_REQUEST: u16 = 0x21;
    pub const GAP_PHY_UPDATE: u16 = 0x22;
    pub const GAP_DATA_LENGTH_UPDATE_REQUEST: u16 = 0x23;
    pub const GAP_DATA_LENGTH_UPDATE: u16 = 0x24;
    pub const GAP_ADV_SET_TERMINATED: u16 = 0x26;

    pub const GATTC_TIMEOUT: u16 = 0x3B;
    pub const GATTS_TIMEOUT: u16 = 0x56;
}

/// One event record delivered by the stack's observer mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEvent {
    pub evt_id: u16,
    pub conn_handle: u16,
}

impl StackEvent {
    pub fn new(evt_id: u16, conn_handle: u16) -> Self {
        Self {
            evt_id,
            conn_handle,
        }
    }
}

/// State notifications from the advertising module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvEvent {
    Idle,
    DirectedHighDuty,
    Directed,
    Fast,
    Slow,
    FastWhitelist,
    SlowWhitelist,
    WhitelistRequest,
    PeerAddrRequest,
}

// ----------------------------------------------------------------------------
// SoftDevice Trait
// ----------------------------------------------------------------------------

/// The vendor radio stack, reachable only through its return-code API
///
/// Calls map one-to-one onto SoftDevice handler and GAP supervisor calls. The stack
/// reports events back by having its dispatcher call into the device's
/// `on_stack_event`, `on_adv_event` and `on_stack_error` entry points.
pub trait SoftDevice {
    /// Whether the SoftDevice is currently enabled
    fn is_enabled(&self) -> bool;

    /// Request the SoftDevice be enabled
    fn enable_request(&mut self) -> StackResult<()>;

    /// Request the SoftDevice be disabled
    fn disable_request(&mut self) -> StackResult<()>;

    /// Apply the default BLE configuration for `conn_cfg_tag`, returning the
    /// application RAM start address the configuration requires
    fn default_cfg_set(&mut self, conn_cfg_tag: u8) -> StackResult<u32>;

    /// Commit the BLE configuration and enable the BLE stack
    fn ble_enable(&mut self, ram_start: u32) -> StackResult<()>;

    /// Register the event observer at the given dispatch priority
    fn register_observer(&mut self, priority: u8);

    /// Set the GAP device name, leaving the name characteristic open for writes
    fn device_name_set(&mut self, name: &[u8]) -> StackResult<()>;

    /// Configure local privacy
    fn privacy_set(&mut self, params: &PrivacyParams) -> StackResult<()>;

    /// Configure an advertising set, allocating a handle if `*handle` is
    /// [`ADV_SET_HANDLE_NOT_SET`]
    fn adv_set_configure(
        &mut self,
        handle: &mut u8,
        data: &AdvData,
        params: &AdvParams,
    ) -> StackResult<()>;

    /// Start advertising on a configured set in fast mode
    fn adv_start(&mut self, handle: u8, conn_cfg_tag: u8) -> StackResult<()>;

    /// Stop advertising on a set
    fn adv_stop(&mut self, handle: u8) -> StackResult<()>;
}
