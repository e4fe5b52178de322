//! Host-side model of the SoftDevice
//!
//! Tracks the same state the real stack enforces (enable ordering, advertising set
//! allocation, one active set) so the nRF52 backend can be exercised without
//! hardware. Any call can be made to fail once with a chosen return code, and
//! every call is recorded in order. Radio-side happenings (a central connecting,
//! an advertising timeout) are triggered explicitly and hand back the event the
//! real stack would dispatch.

use std::collections::HashMap;

use tracing::debug;

use super::{
    evt, AdvData, AdvParams, PrivacyParams, SoftDevice, StackError, StackEvent, StackResult,
    ADV_SET_HANDLE_NOT_SET,
};

/// RAM start address the simulated default configuration requires
pub const SIM_RAM_START: u32 = 0x2000_2260;

/// Legal interval range accepted by `adv_set_configure`, in 0.625 ms units
const MIN_INTERVAL_UNITS: u32 = 0x20;
const MAX_INTERVAL_UNITS: u32 = 0x4000;

const DEVICE_NAME_MAX_LEN: usize = 248;

// ----------------------------------------------------------------------------
// Call Log
// ----------------------------------------------------------------------------

/// Stack entry points that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimStep {
    EnableRequest,
    DisableRequest,
    DefaultCfgSet,
    BleEnable,
    DeviceNameSet,
    PrivacySet,
    AdvSetConfigure,
    AdvStart,
    AdvStop,
}

/// One recorded stack call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    EnableRequest,
    DisableRequest,
    DefaultCfgSet { conn_cfg_tag: u8 },
    BleEnable { ram_start: u32 },
    RegisterObserver { priority: u8 },
    DeviceNameSet { name: Vec<u8> },
    PrivacySet(PrivacyParams),
    AdvSetConfigure { handle: u8, params: AdvParams },
    AdvStart { handle: u8, conn_cfg_tag: u8 },
    AdvStop { handle: u8 },
}

impl SimCall {
    /// The step this call belongs to, if it can fail
    pub fn step(&self) -> Option<SimStep> {
        Some(match self {
            Self::EnableRequest => SimStep::EnableRequest,
            Self::DisableRequest => SimStep::DisableRequest,
            Self::DefaultCfgSet { .. } => SimStep::DefaultCfgSet,
            Self::BleEnable { .. } => SimStep::BleEnable,
            Self::RegisterObserver { .. } => return None,
            Self::DeviceNameSet { .. } => SimStep::DeviceNameSet,
            Self::PrivacySet(_) => SimStep::PrivacySet,
            Self::AdvSetConfigure { .. } => SimStep::AdvSetConfigure,
            Self::AdvStart { .. } => SimStep::AdvStart,
            Self::AdvStop { .. } => SimStep::AdvStop,
        })
    }
}

// ----------------------------------------------------------------------------
// Simulated Stack
// ----------------------------------------------------------------------------

/// Simulated SoftDevice
#[derive(Debug, Default)]
pub struct SimSoftDevice {
    enabled: bool,
    ble_enabled: bool,
    observer_priority: Option<u8>,
    device_name: Vec<u8>,
    privacy: Option<PrivacyParams>,
    configured: Option<(u8, AdvData, AdvParams)>,
    advertising: Option<u8>,
    connection: Option<u16>,
    failures: HashMap<SimStep, StackError>,
    calls: Vec<SimCall>,
}

impl SimSoftDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `step` fail with `err`
    pub fn fail_next(&mut self, step: SimStep, err: StackError) {
        self.failures.insert(step, err);
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> &[SimCall] {
        &self.calls
    }

    /// The steps of the recorded calls, skipping infallible ones
    pub fn steps(&self) -> Vec<SimStep> {
        self.calls.iter().filter_map(SimCall::step).collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn is_ble_enabled(&self) -> bool {
        self.ble_enabled
    }

    pub fn observer_priority(&self) -> Option<u8> {
        self.observer_priority
    }

    pub fn device_name(&self) -> &[u8] {
        &self.device_name
    }

    pub fn privacy(&self) -> Option<&PrivacyParams> {
        self.privacy.as_ref()
    }

    /// Parameters of the configured advertising set
    pub fn adv_params(&self) -> Option<&AdvParams> {
        self.configured.as_ref().map(|(_, _, params)| params)
    }

    /// Data of the configured advertising set
    pub fn adv_data(&self) -> Option<&AdvData> {
        self.configured.as_ref().map(|(_, data, _)| data)
    }

    /// Handle of the set currently advertising
    pub fn advertising_handle(&self) -> Option<u8> {
        self.advertising
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising.is_some()
    }

    /// Handle of the connected central, if any
    pub fn connection(&self) -> Option<u16> {
        self.connection
    }

    /// A central connects on `conn_handle`
    ///
    /// The stack ends advertising on the set the central connected through.
    pub fn connect(&mut self, conn_handle: u16) -> StackEvent {
        debug!("sim central connected on handle {}", conn_handle);
        self.advertising = None;
        self.connection = Some(conn_handle);
        StackEvent::new(evt::GAP_CONNECTED, conn_handle)
    }

    /// The central on `conn_handle` disconnects
    pub fn disconnect(&mut self, conn_handle: u16) -> StackEvent {
        debug!("sim central disconnected from handle {}", conn_handle);
        if self.connection == Some(conn_handle) {
            self.connection = None;
        }
        StackEvent::new(evt::GAP_DISCONNECTED, conn_handle)
    }

    /// The advertising duration elapses
    pub fn adv_timeout(&mut self) -> StackEvent {
        debug!("sim advertising timed out");
        self.advertising = None;
        StackEvent::new(evt::GAP_ADV_SET_TERMINATED, super::CONN_HANDLE_INVALID)
    }

    fn enter(&mut self, call: SimCall) -> StackResult<()> {
        let step = call.step();
        debug!("sim stack call: {:?}", call);
        self.calls.push(call);
        match step.and_then(|step| self.failures.remove(&step)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_ble(&self) -> StackResult<()> {
        if self.ble_enabled {
            Ok(())
        } else {
            Err(StackError::INVALID_STATE)
        }
    }
}

impl SoftDevice for SimSoftDevice {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable_request(&mut self) -> StackResult<()> {
        self.enter(SimCall::EnableRequest)?;
        if self.enabled {
            return Err(StackError::INVALID_STATE);
        }
        self.enabled = true;
        Ok(())
    }

    fn disable_request(&mut self) -> StackResult<()> {
        self.enter(SimCall::DisableRequest)?;
        self.enabled = false;
        self.ble_enabled = false;
        self.observer_priority = None;
        self.configured = None;
        self.advertising = None;
        self.connection = None;
        Ok(())
    }

    fn default_cfg_set(&mut self, conn_cfg_tag: u8) -> StackResult<u32> {
        self.enter(SimCall::DefaultCfgSet { conn_cfg_tag })?;
        if !self.enabled {
            return Err(StackError::INVALID_STATE);
        }
        Ok(SIM_RAM_START)
    }

    fn ble_enable(&mut self, ram_start: u32) -> StackResult<()> {
        self.enter(SimCall::BleEnable { ram_start })?;
        if !self.enabled || self.ble_enabled {
            return Err(StackError::INVALID_STATE);
        }
        if ram_start < SIM_RAM_START {
            return Err(StackError::NO_MEM);
        }
        self.ble_enabled = true;
        Ok(())
    }

    fn register_observer(&mut self, priority: u8) {
        let _ = self.enter(SimCall::RegisterObserver { priority });
        self.observer_priority = Some(priority);
    }

    fn device_name_set(&mut self, name: &[u8]) -> StackResult<()> {
        self.enter(SimCall::DeviceNameSet {
            name: name.to_vec(),
        })?;
        self.require_ble()?;
        if name.len() > DEVICE_NAME_MAX_LEN {
            return Err(StackError::DATA_SIZE);
        }
        self.device_name = name.to_vec();
        Ok(())
    }

    fn privacy_set(&mut self, params: &PrivacyParams) -> StackResult<()> {
        self.enter(SimCall::PrivacySet(params.clone()))?;
        self.require_ble()?;
        self.privacy = Some(params.clone());
        Ok(())
    }

    fn adv_set_configure(
        &mut self,
        handle: &mut u8,
        data: &AdvData,
        params: &AdvParams,
    ) -> StackResult<()> {
        self.enter(SimCall::AdvSetConfigure {
            handle: *handle,
            params: params.clone(),
        })?;
        self.require_ble()?;
        if !(MIN_INTERVAL_UNITS..=MAX_INTERVAL_UNITS).contains(&params.interval) {
            return Err(StackError::INVALID_PARAM);
        }
        if !params.adv_type.is_scannable() && !data.scan_rsp_data.is_empty() {
            return Err(StackError::INVALID_PARAM);
        }
        if params.adv_type.is_directed() && params.peer_addr.is_none() {
            return Err(StackError::INVALID_PARAM);
        }

        // Only one advertising set is supported, always handle 0.
        let assigned = match *handle {
            ADV_SET_HANDLE_NOT_SET => 0,
            0 => 0,
            _ => return Err(StackError::INVALID_ADV_HANDLE),
        };
        if self.advertising == Some(assigned) {
            return Err(StackError::INVALID_STATE);
        }

        *handle = assigned;
        self.configured = Some((assigned, data.clone(), params.clone()));
        Ok(())
    }

    fn adv_start(&mut self, handle: u8, conn_cfg_tag: u8) -> StackResult<()> {
        self.enter(SimCall::AdvStart {
            handle,
            conn_cfg_tag,
        })?;
        self.require_ble()?;
        match &self.configured {
            Some((configured, _, _)) if *configured == handle => {}
            _ => return Err(StackError::INVALID_ADV_HANDLE),
        }
        if self.advertising.is_some() {
            return Err(StackError::INVALID_STATE);
        }
        self.advertising = Some(handle);
        Ok(())
    }

    fn adv_stop(&mut self, handle: u8) -> StackResult<()> {
        self.enter(SimCall::AdvStop { handle })?;
        self.require_ble()?;
        if self.advertising != Some(handle) {
            return Err(StackError::INVALID_STATE);
        }
        self.advertising = None;
        Ok(())
    }
}
