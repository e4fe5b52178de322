//! Vendor-neutral device API and its backends

pub mod dummy;
pub mod nrf52;

pub use dummy::DummyBle;
pub use nrf52::Nrf52Ble;

use crate::address::{AddressType, DeviceAddress};
use crate::advertising::AdvMode;
use crate::error::BleResult;
use crate::event::EventCallback;

// ----------------------------------------------------------------------------
// Device Trait
// ----------------------------------------------------------------------------

/// BLE peripheral operations, implemented identically by every backend
///
/// Setters only change held state; nothing reaches the radio until
/// [`adv_start`](BleDevice::adv_start).
pub trait BleDevice {
    /// Bring up the radio with the given identity
    ///
    /// Succeeds without doing anything if a device already holds the radio
    /// session. `addr` replaces the stored address when given.
    fn enable(&mut self, addr_type: AddressType, addr: Option<DeviceAddress>) -> BleResult<()>;

    /// Release the radio session; always succeeds
    fn disable(&mut self) -> BleResult<()>;

    /// Install the callback for GAP events, replacing any previous one
    fn register_gap_event_callback(&mut self, callback: EventCallback);

    /// Install the callback for GATT events, replacing any previous one
    fn register_gatt_event_callback(&mut self, callback: EventCallback);

    /// Stored address type and address
    fn device_address(&self) -> (AddressType, DeviceAddress);

    /// Reset advertising state to the defaults for `mode`
    fn adv_init(&mut self, mode: AdvMode) -> BleResult<()>;

    /// Set the advertising interval bounds, in milliseconds
    fn adv_set_interval(&mut self, min_ms: u16, max_ms: u16) -> BleResult<()>;

    /// Set how long to advertise, in milliseconds; 0 advertises until stopped
    fn adv_set_duration(&mut self, msec: u32) -> BleResult<()>;

    /// Copy raw AD-structure bytes into the advertising payload
    fn adv_set_payload(&mut self, payload: &[u8]) -> BleResult<()>;

    /// Copy raw AD-structure bytes into the scan response
    fn adv_set_scan_response(&mut self, payload: &[u8]) -> BleResult<()>;

    /// Submit the held configuration and start advertising
    fn adv_start(&mut self) -> BleResult<()>;

    /// Stop advertising
    fn adv_stop(&mut self) -> BleResult<()>;

    /// Check if currently advertising
    fn is_advertising(&self) -> bool;
}
