//! Tests for radio bring-up, teardown and the shared session
//!
//! These tests drive the nRF52 backend against the simulated stack and check
//! the order of stack calls, the error reported for each failing step, and how
//! devices sharing a session interact.

use pble::stack::sim::{SimCall, SimStep};
use pble::stack::{GapAddrType, StackError};
use pble::{
    AddressType, BleConfig, BleDevice, BleError, DeviceAddress, Nrf52Ble, RadioSession,
    SimSoftDevice, SoftDevice,
};

fn device(session: &RadioSession) -> Nrf52Ble<SimSoftDevice> {
    Nrf52Ble::new(SimSoftDevice::new(), session.clone())
}

// ----------------------------------------------------------------------------
// Bring-up
// ----------------------------------------------------------------------------

#[test]
fn test_enable_sequence_and_identity() {
    let session = RadioSession::new();
    let config = BleConfig::new()
        .with_device_name("sensor-7")
        .with_conn_cfg_tag(2)
        .with_observer_priority(5);
    let mut ble = Nrf52Ble::with_config(SimSoftDevice::new(), session.clone(), config).unwrap();

    let addr: DeviceAddress = "C0:11:22:33:44:55".parse().unwrap();
    ble.enable(AddressType::StaticRandom, Some(addr)).unwrap();

    let calls = ble.stack().calls();
    assert_eq!(calls[0], SimCall::EnableRequest);
    assert_eq!(calls[1], SimCall::DefaultCfgSet { conn_cfg_tag: 2 });
    assert!(matches!(calls[2], SimCall::BleEnable { .. }));
    assert_eq!(calls[3], SimCall::RegisterObserver { priority: 5 });
    assert_eq!(
        calls[4],
        SimCall::DeviceNameSet {
            name: b"sensor-7".to_vec()
        }
    );
    assert!(matches!(calls[5], SimCall::PrivacySet(_)));
    assert_eq!(calls.len(), 6);

    let privacy = ble.stack().privacy().unwrap();
    assert_eq!(privacy.private_addr_type, GapAddrType::RandomStatic);
    assert_eq!(privacy.private_addr_cycle_s, 900);
    assert!(privacy.device_irk.is_none());

    assert_eq!(session.active(), Some(ble.id()));
    assert_eq!(ble.device_address(), (AddressType::StaticRandom, addr));
}

#[test]
fn test_enable_without_address_keeps_stored_address() {
    let session = RadioSession::new();
    let mut ble = device(&session);
    ble.enable(AddressType::ResolvablePrivate, None).unwrap();

    let (addr_type, addr) = ble.device_address();
    assert_eq!(addr_type, AddressType::ResolvablePrivate);
    assert!(addr.is_zero());
}

#[test]
fn test_failure_codes_per_step() {
    let cases = [
        (SimStep::EnableRequest, -67),
        (SimStep::DefaultCfgSet, -22),
        (SimStep::BleEnable, -99),
        (SimStep::DeviceNameSet, -11),
        (SimStep::PrivacySet, -11),
    ];

    for (step, expected) in cases {
        let session = RadioSession::new();
        let mut ble = device(&session);
        ble.stack_mut().fail_next(step, StackError::INTERNAL);

        let err = ble.enable(AddressType::Public, None).unwrap_err();
        assert_eq!(err.code(), expected, "failing {:?}", step);
        assert_eq!(err.stack_error().is_some(), step != SimStep::DefaultCfgSet);
        assert_eq!(session.active(), None);
    }
}

#[test]
fn test_failed_bring_up_disables_stack() {
    let session = RadioSession::new();
    let mut ble = device(&session);
    ble.stack_mut()
        .fail_next(SimStep::DeviceNameSet, StackError::DATA_SIZE);

    let err = ble.enable(AddressType::Public, None).unwrap_err();
    assert!(matches!(
        err,
        BleError::Retry {
            operation: "set device name",
            code: StackError::DATA_SIZE
        }
    ));
    assert_eq!(ble.stack().steps().last(), Some(&SimStep::DisableRequest));
    assert!(!ble.stack().is_enabled());

    // The next attempt starts from the first step again
    ble.stack_mut().clear_calls();
    ble.enable(AddressType::Public, None).unwrap();
    assert_eq!(ble.stack().steps()[0], SimStep::EnableRequest);
    assert!(ble.is_enabled());
}

#[test]
fn test_privacy_failure_is_fatal() {
    let session = RadioSession::new();
    let mut ble = device(&session);
    ble.stack_mut()
        .fail_next(SimStep::PrivacySet, StackError::INVALID_PARAM);

    assert!(ble.enable(AddressType::NonResolvablePrivate, None).is_err());
    assert!(!ble.is_enabled());
    assert!(!ble.stack().is_enabled());
}

// ----------------------------------------------------------------------------
// Shared Session
// ----------------------------------------------------------------------------

#[test]
fn test_second_device_enable_is_a_no_op() {
    let session = RadioSession::new();
    let mut first = device(&session);
    let mut second = device(&session);

    first.enable(AddressType::Public, None).unwrap();
    second.enable(AddressType::StaticRandom, None).unwrap();

    assert!(first.is_enabled());
    assert!(!second.is_enabled());
    assert!(second.stack().calls().is_empty());
    assert_eq!(second.device_address().0, AddressType::Public);

    // Enabling the holder again does not re-run bring-up either
    first.stack_mut().clear_calls();
    first.enable(AddressType::Public, None).unwrap();
    assert!(first.stack().calls().is_empty());
}

#[test]
fn test_disable_then_enable_runs_full_bring_up() {
    let session = RadioSession::new();
    let mut ble = device(&session);
    ble.enable(AddressType::Public, None).unwrap();
    ble.disable().unwrap();

    assert_eq!(session.active(), None);
    assert!(!ble.stack().is_enabled());

    ble.stack_mut().clear_calls();
    ble.enable(AddressType::Public, None).unwrap();
    assert_eq!(
        ble.stack().steps(),
        vec![
            SimStep::EnableRequest,
            SimStep::DefaultCfgSet,
            SimStep::BleEnable,
            SimStep::DeviceNameSet,
            SimStep::PrivacySet,
        ]
    );
}

#[test]
fn test_disable_from_other_device_frees_session() {
    let session = RadioSession::new();
    let mut first = device(&session);
    let mut second = device(&session);

    first.enable(AddressType::Public, None).unwrap();
    second.disable().unwrap();
    assert_eq!(session.active(), None);

    second.enable(AddressType::Public, None).unwrap();
    assert!(second.is_enabled());
}

#[test]
fn test_disable_is_always_ok() {
    let session = RadioSession::new();
    let mut ble = device(&session);
    assert!(ble.disable().is_ok());

    ble.enable(AddressType::Public, None).unwrap();
    ble.adv_start().unwrap();
    ble.stack_mut()
        .fail_next(SimStep::DisableRequest, StackError::INTERNAL);
    assert!(ble.disable().is_ok());
    assert!(!ble.is_advertising());
    assert_eq!(session.active(), None);
}

#[test]
fn test_invalid_config_is_rejected() {
    let session = RadioSession::new();
    let config = BleConfig::new().with_conn_cfg_tag(0);
    let err = Nrf52Ble::with_config(SimSoftDevice::new(), session, config).unwrap_err();
    assert_eq!(err.code(), -22);
}
