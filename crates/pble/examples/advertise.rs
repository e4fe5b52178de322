//! Bring up the simulated stack, advertise, and walk through a connection
//!
//! Run with `RUST_LOG=debug` to see every stack call.

use pble::payload::ad_type;
use pble::{
    AddressType, AdvEvent, AdvMode, AdvPayload, BleConfig, BleDevice, BleError, DeviceAddress,
    Nrf52Ble, RadioSession, SimSoftDevice,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), BleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = BleConfig::new()
        .with_device_name("pble-demo")
        .with_restart_on_disconnect(true);
    let session = RadioSession::new();
    let mut ble = Nrf52Ble::with_config(SimSoftDevice::new(), session, config)?;

    ble.register_gap_event_callback(Box::new(|event| {
        info!("GAP callback: {:?}", event);
    }));

    let addr: DeviceAddress = "C0:FF:EE:00:00:01".parse()?;
    ble.enable(AddressType::StaticRandom, Some(addr))?;

    let mut payload = AdvPayload::new();
    payload.push_ad_field(ad_type::FLAGS, &[0x06])?;
    payload.push_ad_field(ad_type::COMPLETE_LOCAL_NAME, b"pble-demo")?;

    ble.adv_init(AdvMode::ConnectableScannableUndirected)?;
    ble.adv_set_interval(100, 150)?;
    ble.adv_set_payload(payload.as_bytes())?;
    ble.adv_start()?;
    ble.on_adv_event(AdvEvent::Fast);

    let connected = ble.stack_mut().connect(0);
    ble.on_stack_event(&connected);
    info!(
        "connected on handle {:?}, advertising: {}",
        ble.connection_handle(),
        ble.is_advertising()
    );
    let disconnected = ble.stack_mut().disconnect(0);
    ble.on_stack_event(&disconnected);
    info!("advertising again: {}", ble.is_advertising());

    ble.adv_stop()?;
    ble.on_adv_event(AdvEvent::Idle);
    ble.disable()
}
