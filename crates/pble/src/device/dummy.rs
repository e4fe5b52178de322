//! No-op backend for targets without a supported radio

use tracing::warn;

use crate::address::{AddressType, DeviceAddress};
use crate::advertising::AdvMode;
use crate::error::BleResult;
use crate::event::EventCallback;

use super::BleDevice;

// ----------------------------------------------------------------------------
// Dummy Implementation
// ----------------------------------------------------------------------------

/// Backend that accepts every call and never touches a radio
#[derive(Debug, Default)]
pub struct DummyBle;

impl DummyBle {
    pub fn new() -> Self {
        Self
    }
}

impl BleDevice for DummyBle {
    fn enable(&mut self, _addr_type: AddressType, _addr: Option<DeviceAddress>) -> BleResult<()> {
        warn!("BLE not supported on this target. The device will not be discoverable.");
        Ok(())
    }

    fn disable(&mut self) -> BleResult<()> {
        Ok(())
    }

    fn register_gap_event_callback(&mut self, _callback: EventCallback) {}

    fn register_gatt_event_callback(&mut self, _callback: EventCallback) {}

    fn device_address(&self) -> (AddressType, DeviceAddress) {
        (AddressType::default(), DeviceAddress::default())
    }

    fn adv_init(&mut self, _mode: AdvMode) -> BleResult<()> {
        Ok(())
    }

    fn adv_set_interval(&mut self, _min_ms: u16, _max_ms: u16) -> BleResult<()> {
        Ok(())
    }

    fn adv_set_duration(&mut self, _msec: u32) -> BleResult<()> {
        Ok(())
    }

    fn adv_set_payload(&mut self, _payload: &[u8]) -> BleResult<()> {
        Ok(())
    }

    fn adv_set_scan_response(&mut self, _payload: &[u8]) -> BleResult<()> {
        Ok(())
    }

    fn adv_start(&mut self) -> BleResult<()> {
        warn!("BLE advertising not supported on this target");
        Ok(())
    }

    fn adv_stop(&mut self) -> BleResult<()> {
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        false
    }
}
