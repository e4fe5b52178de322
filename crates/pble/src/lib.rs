//! Portable BLE peripheral layer
//!
//! This crate exposes a vendor-neutral advertiser API and an nRF52 backend that
//! drives a SoftDevice-style radio stack through the [`SoftDevice`] trait.
//!
//! ## Architecture
//!
//! - [`device`] - The [`BleDevice`] trait and its backends
//! - [`advertising`] - Held advertising state and unit conversion
//! - [`event`] - Stack event classification and callback dispatch
//! - [`session`] - The shared radio session that elects one enabled device
//! - [`stack`] - Vendor stack types, the [`SoftDevice`] trait and a simulator
//! - [`payload`] - Fixed-capacity advertising payload buffers
//! - [`address`] - Device address and address types
//! - [`config`] - Backend configuration
//! - [`error`] - Error types and errno-style status codes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pble::{AddressType, AdvMode, BleDevice, Nrf52Ble, RadioSession, SimSoftDevice};
//!
//! # fn example() -> Result<(), pble::BleError> {
//! let session = RadioSession::new();
//! let mut ble = Nrf52Ble::new(SimSoftDevice::new(), session);
//!
//! ble.enable(AddressType::Public, None)?;
//! ble.adv_init(AdvMode::ConnectableScannableUndirected)?;
//! ble.adv_set_payload(&[0x02, 0x01, 0x06])?;
//! ble.adv_start()?;
//! # Ok(())
//! # }
//! ```
//!
//! Configuration setters never touch the radio. Everything is submitted to the
//! stack in one step by `adv_start`.

pub mod address;
pub mod advertising;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod payload;
pub mod session;
pub mod stack;

// Public API exports
pub use address::{AddressType, DeviceAddress};
pub use advertising::{AdvMode, AdvState};
pub use config::BleConfig;
pub use device::{BleDevice, DummyBle, Nrf52Ble};
pub use error::{status_code, BleError, BleResult};
pub use event::{BleEvent, EventCallback, EventCategory, EventSource};
pub use payload::AdvPayload;
pub use session::{DeviceId, RadioSession};
pub use stack::sim::SimSoftDevice;
pub use stack::{AdvEvent, SoftDevice, StackError, StackEvent};
