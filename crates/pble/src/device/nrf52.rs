//! nRF52 SoftDevice backend
//!
//! Bring-up runs the SoftDevice handler sequence (enable request, default BLE
//! configuration, BLE enable, observer registration) and then the GAP identity
//! settings. Advertising configuration is held locally and only translated into an
//! advertising set when `adv_start` is called, so setters may be called in any
//! order between `adv_init` and `adv_start`.

use tracing::{debug, error, info, warn};

use crate::address::{AddressType, DeviceAddress};
use crate::advertising::{validate_duration, validate_interval, AdvMode, AdvState};
use crate::config::BleConfig;
use crate::error::{BleError, BleResult};
use crate::event::{log_adv_event, log_stack_error, BleEvent, EventCallback, EventTranslator};
use crate::payload::AdvPayload;
use crate::session::{Claim, DeviceId, RadioSession};
use crate::stack::{evt, AdvEvent, SoftDevice, StackError, StackEvent, CONN_HANDLE_INVALID};

use super::BleDevice;

// ----------------------------------------------------------------------------
// nRF52 Implementation
// ----------------------------------------------------------------------------

/// BLE device backed by a SoftDevice
pub struct Nrf52Ble<S: SoftDevice> {
    stack: S,
    config: BleConfig,
    session: RadioSession,
    id: DeviceId,
    events: EventTranslator,
    addr_type: AddressType,
    addr: DeviceAddress,
    conn_handle: u16,
    adv: AdvState,
    advertising: bool,
}

impl<S: SoftDevice> Nrf52Ble<S> {
    /// Create a device with the default configuration
    pub fn new(stack: S, session: RadioSession) -> Self {
        let config = BleConfig::default();
        let id = session.register();
        Self {
            stack,
            adv: AdvState::new(AdvMode::default(), &config),
            config,
            session,
            id,
            events: EventTranslator::new(),
            addr_type: AddressType::default(),
            addr: DeviceAddress::default(),
            conn_handle: CONN_HANDLE_INVALID,
            advertising: false,
        }
    }

    /// Create a device with a custom configuration
    pub fn with_config(stack: S, session: RadioSession, config: BleConfig) -> BleResult<Self> {
        config.validate()?;
        let mut device = Self::new(stack, session);
        device.adv = AdvState::new(AdvMode::default(), &config);
        device.config = config;
        Ok(device)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn config(&self) -> &BleConfig {
        &self.config
    }

    pub fn session(&self) -> &RadioSession {
        &self.session
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Whether this device holds the radio session
    pub fn is_enabled(&self) -> bool {
        self.session.is_active(self.id)
    }

    /// Handle of the current connection, if a central is connected
    pub fn connection_handle(&self) -> Option<u16> {
        (self.conn_handle != CONN_HANDLE_INVALID).then_some(self.conn_handle)
    }

    /// Held advertising state
    pub fn adv_state(&self) -> &AdvState {
        &self.adv
    }

    /// Set the peer targeted by directed advertising
    ///
    /// Cleared by `adv_init`. The stack refuses directed advertising without one.
    pub fn adv_set_peer_address(&mut self, addr_type: AddressType, addr: DeviceAddress) {
        self.adv.peer = Some(addr.to_gap_addr(addr_type));
    }

    /// Return the device to its freshly constructed state
    ///
    /// Advertising is stopped and the stack turned off before state is cleared.
    pub fn reset(&mut self) {
        self.shutdown_stack();
        if self.is_enabled() {
            self.session.release();
        }
        self.events.clear();
        self.addr_type = AddressType::default();
        self.addr = DeviceAddress::default();
        self.conn_handle = CONN_HANDLE_INVALID;
        self.adv = AdvState::new(AdvMode::default(), &self.config);
        self.advertising = false;
    }

    // ------------------------------------------------------------------------
    // Bring-up
    // ------------------------------------------------------------------------

    fn initialize(&mut self, addr_type: AddressType) -> BleResult<()> {
        self.stack.enable_request().map_err(|code| {
            error!("softdevice not ready: {}", code);
            BleError::LinkUnavailable { code }
        })?;

        if let Err(err) = self.configure_stack(addr_type) {
            // Leave the stack off so the next enable starts from the first step.
            if let Err(code) = self.stack.disable_request() {
                warn!("softdevice disable after failed bring-up: {}", code);
            }
            return Err(err);
        }
        Ok(())
    }

    fn configure_stack(&mut self, addr_type: AddressType) -> BleResult<()> {
        let ram_start = self
            .stack
            .default_cfg_set(self.config.conn_cfg_tag)
            .map_err(|code| {
                error!("invalid softdevice configuration: {}", code);
                BleError::invalid_configuration(format!(
                    "default stack configuration rejected: {}",
                    code
                ))
            })?;

        self.stack.ble_enable(ram_start).map_err(|code| {
            error!(
                "BLE start failure. Check RAM start address: {:#x}",
                ram_start
            );
            BleError::AddressUnavailable { ram_start, code }
        })?;

        self.stack.register_observer(self.config.observer_priority);

        self.stack
            .device_name_set(self.config.device_name.as_bytes())
            .map_err(|code| {
                error!("can not set device name: {}", code);
                BleError::Retry {
                    operation: "set device name",
                    code,
                }
            })?;

        let privacy = addr_type.privacy_params(self.config.private_addr_cycle_s);
        self.stack.privacy_set(&privacy).map_err(|code| {
            error!("can not set privacy parameters: {}", code);
            BleError::Retry {
                operation: "set privacy parameters",
                code,
            }
        })?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Advertising
    // ------------------------------------------------------------------------

    fn submit_advertising(&mut self) -> BleResult<()> {
        let params = self.adv.to_params();
        let data = self.adv.to_data();
        let mut handle = self.adv.set.handle;

        self.stack
            .adv_set_configure(&mut handle, &data, &params)
            .map_err(|code| {
                error!("advertising configure failure: {}", code);
                BleError::NetworkDown {
                    operation: "configure advertising",
                    code,
                }
            })?;
        self.adv.set.handle = handle;
        self.adv.set.params = Some(params);
        self.adv.set.data = data;

        self.stack
            .adv_start(handle, self.config.conn_cfg_tag)
            .map_err(|code| {
                error!("advertising start failure: {}", code);
                BleError::NetworkDown {
                    operation: "start advertising",
                    code,
                }
            })?;

        self.advertising = true;
        info!(
            "Advertising {:?} every {} ms ({} bytes payload)",
            self.adv.mode,
            self.adv.min_ms,
            self.adv.payload.len()
        );
        Ok(())
    }

    fn halt_advertising(&mut self) -> Result<(), StackError> {
        if !self.adv.set.is_allocated() || !self.stack.is_enabled() {
            self.advertising = false;
            return Ok(());
        }

        match self.stack.adv_stop(self.adv.set.handle) {
            // Nothing was advertising on the set
            Ok(()) | Err(StackError::INVALID_STATE) => {
                self.advertising = false;
                Ok(())
            }
            Err(code) => {
                error!("advertising stop failure: {}", code);
                Err(code)
            }
        }
    }

    /// Stop advertising and turn the stack off, forgetting stack-owned state
    fn shutdown_stack(&mut self) {
        if self.stack.is_enabled() {
            if let Err(code) = self.halt_advertising() {
                warn!("advertising stop before disable failed: {}", code);
            }
            if let Err(code) = self.stack.disable_request() {
                warn!("softdevice disable request failed: {}", code);
            }
        }
        self.advertising = false;
        self.conn_handle = CONN_HANDLE_INVALID;
        // The stack forgets advertising sets once disabled.
        self.adv.set = Default::default();
    }

    // ------------------------------------------------------------------------
    // Stack Event Entry Points
    // ------------------------------------------------------------------------

    /// Handle an event from the stack's observer dispatch
    pub fn on_stack_event(&mut self, event: &StackEvent) -> BleEvent {
        match event.evt_id {
            evt::GAP_CONNECTED => {
                self.conn_handle = event.conn_handle;
                // Connectable advertising ends when a central connects.
                self.advertising = false;
            }
            evt::GAP_DISCONNECTED => self.conn_handle = CONN_HANDLE_INVALID,
            evt::GAP_ADV_SET_TERMINATED => self.advertising = false,
            _ => {}
        }

        let translated = self.events.translate(event);

        if event.evt_id == evt::GAP_DISCONNECTED && self.config.restart_on_disconnect {
            if let Err(err) = self.adv_start() {
                warn!("advertising restart after disconnect failed: {}", err);
            }
        }
        translated
    }

    /// Handle a state notification from the advertising module
    pub fn on_adv_event(&mut self, event: AdvEvent) {
        log_adv_event(event);
        match event {
            AdvEvent::Idle => self.advertising = false,
            AdvEvent::Fast
            | AdvEvent::Slow
            | AdvEvent::Directed
            | AdvEvent::DirectedHighDuty
            | AdvEvent::FastWhitelist
            | AdvEvent::SlowWhitelist => self.advertising = true,
            AdvEvent::WhitelistRequest | AdvEvent::PeerAddrRequest => {}
        }
    }

    /// Handle an asynchronous error reported by the stack
    pub fn on_stack_error(&self, err: StackError) {
        log_stack_error(err);
    }
}

impl<S: SoftDevice> BleDevice for Nrf52Ble<S> {
    fn enable(&mut self, addr_type: AddressType, addr: Option<DeviceAddress>) -> BleResult<()> {
        if let Claim::Held(holder) = self.session.try_claim(self.id) {
            debug!(
                "radio already enabled by device {}, ignoring enable",
                holder.get()
            );
            return Ok(());
        }

        if let Err(err) = self.initialize(addr_type) {
            self.session.abandon(self.id);
            return Err(err);
        }

        if !self.session.commit(self.id) {
            warn!("radio session released during bring-up, turning stack off");
            self.shutdown_stack();
            return Err(BleError::Retry {
                operation: "claim radio session",
                code: StackError::BUSY,
            });
        }

        self.addr_type = addr_type;
        if let Some(addr) = addr {
            self.addr = addr;
        }
        info!("BLE enabled with {:?} address {}", addr_type, self.addr);
        Ok(())
    }

    fn disable(&mut self) -> BleResult<()> {
        self.shutdown_stack();
        self.session.release();
        info!("BLE disabled");
        Ok(())
    }

    fn register_gap_event_callback(&mut self, callback: EventCallback) {
        self.events.register_gap(callback);
    }

    fn register_gatt_event_callback(&mut self, callback: EventCallback) {
        self.events.register_gatt(callback);
    }

    fn device_address(&self) -> (AddressType, DeviceAddress) {
        (self.addr_type, self.addr)
    }

    fn adv_init(&mut self, mode: AdvMode) -> BleResult<()> {
        // The stack keeps owning an allocated set across re-initialisation.
        let set = std::mem::take(&mut self.adv.set);
        self.adv = AdvState::new(mode, &self.config);
        self.adv.set.handle = set.handle;
        debug!("advertising initialised for {:?}", mode);
        Ok(())
    }

    fn adv_set_interval(&mut self, min_ms: u16, max_ms: u16) -> BleResult<()> {
        validate_interval(min_ms, max_ms)?;
        self.adv.min_ms = min_ms;
        self.adv.max_ms = max_ms;
        Ok(())
    }

    fn adv_set_duration(&mut self, msec: u32) -> BleResult<()> {
        validate_duration(msec)?;
        self.adv.duration_ms = msec;
        Ok(())
    }

    fn adv_set_payload(&mut self, payload: &[u8]) -> BleResult<()> {
        self.adv.payload = AdvPayload::from_slice(payload)?;
        Ok(())
    }

    fn adv_set_scan_response(&mut self, payload: &[u8]) -> BleResult<()> {
        self.adv.scan_response = AdvPayload::from_slice(payload)?;
        Ok(())
    }

    fn adv_start(&mut self) -> BleResult<()> {
        if !self.stack.is_enabled() {
            return Err(BleError::NotReady);
        }
        if self.advertising {
            self.halt_advertising().map_err(|code| BleError::NetworkDown {
                operation: "restart advertising",
                code,
            })?;
        }
        self.submit_advertising()
    }

    fn adv_stop(&mut self) -> BleResult<()> {
        self.halt_advertising().map_err(|code| BleError::Fault {
            reason: format!("advertising stop failure: {}", code),
        })
    }

    fn is_advertising(&self) -> bool {
        self.advertising
    }
}

impl<S: SoftDevice + core::fmt::Debug> core::fmt::Debug for Nrf52Ble<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Nrf52Ble")
            .field("stack", &self.stack)
            .field("id", &self.id)
            .field("addr_type", &self.addr_type)
            .field("addr", &self.addr)
            .field("conn_handle", &self.conn_handle)
            .field("adv", &self.adv)
            .field("advertising", &self.advertising)
            .finish()
    }
}
