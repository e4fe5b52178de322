//! Stack event translation
//!
//! The stack reports events from a code space far larger than this layer cares
//! about. Each code is classified into an [`EventCategory`] and forwarded to the
//! registered GAP or GATT callback, or logged when no callback is installed.
//! Translation runs in the stack's dispatch context: it never blocks and never
//! allocates.

use tracing::{error, info};

use crate::stack::{evt, AdvEvent, StackError, StackEvent, CONN_HANDLE_INVALID};

// ----------------------------------------------------------------------------
// Event Types
// ----------------------------------------------------------------------------

/// Normalized event class handed to callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    ConnectionLifecycle,
    SecurityNegotiation,
    Timeout,
    Unrecognized,
}

/// Protocol layer an event originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Gap,
    GattClient,
    GattServer,
    Other,
}

impl EventSource {
    pub fn of(evt_id: u16) -> Self {
        match evt_id {
            evt::GAP_EVT_BASE..=evt::GAP_EVT_LAST => Self::Gap,
            evt::GATTC_EVT_BASE..=evt::GATTC_EVT_LAST => Self::GattClient,
            evt::GATTS_EVT_BASE..=evt::GATTS_EVT_LAST => Self::GattServer,
            _ => Self::Other,
        }
    }

    pub fn is_gatt(self) -> bool {
        matches!(self, Self::GattClient | Self::GattServer)
    }
}

/// Classify a vendor event id
pub fn classify(evt_id: u16) -> EventCategory {
    match evt_id {
        evt::GAP_CONNECTED
        | evt::GAP_DISCONNECTED
        | evt::GAP_CONN_PARAM_UPDATE
        | evt::GAP_CONN_PARAM_UPDATE_REQUEST
        | evt::GAP_PHY_UPDATE_REQUEST
        | evt::GAP_PHY_UPDATE
        | evt::GAP_DATA_LENGTH_UPDATE_REQUEST
        | evt::GAP_DATA_LENGTH_UPDATE
        | evt::GAP_ADV_SET_TERMINATED => EventCategory::ConnectionLifecycle,

        evt::GAP_SEC_PARAMS_REQUEST
        | evt::GAP_SEC_INFO_REQUEST
        | evt::GAP_PASSKEY_DISPLAY
        | evt::GAP_KEY_PRESSED
        | evt::GAP_AUTH_KEY_REQUEST
        | evt::GAP_LESC_DHKEY_REQUEST
        | evt::GAP_AUTH_STATUS
        | evt::GAP_CONN_SEC_UPDATE
        | evt::GAP_SEC_REQUEST => EventCategory::SecurityNegotiation,

        evt::GAP_TIMEOUT | evt::GATTC_TIMEOUT | evt::GATTS_TIMEOUT => EventCategory::Timeout,

        _ => EventCategory::Unrecognized,
    }
}

/// A translated stack event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleEvent {
    pub category: EventCategory,
    pub source: EventSource,
    /// Raw vendor event id
    pub evt_id: u16,
    pub conn_handle: Option<u16>,
}

impl BleEvent {
    pub fn from_stack(event: &StackEvent) -> Self {
        Self {
            category: classify(event.evt_id),
            source: EventSource::of(event.evt_id),
            evt_id: event.evt_id,
            conn_handle: (event.conn_handle != CONN_HANDLE_INVALID).then_some(event.conn_handle),
        }
    }
}

/// Callback receiving translated events
///
/// Runs in the stack's dispatch context and must return promptly.
pub type EventCallback = Box<dyn FnMut(&BleEvent) + Send>;

// ----------------------------------------------------------------------------
// Translator
// ----------------------------------------------------------------------------

/// Routes translated events to the registered callbacks
#[derive(Default)]
pub struct EventTranslator {
    gap_callback: Option<EventCallback>,
    gatt_callback: Option<EventCallback>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the GAP callback, replacing any previous one
    pub fn register_gap(&mut self, callback: EventCallback) {
        self.gap_callback = Some(callback);
    }

    /// Install the GATT callback, replacing any previous one
    pub fn register_gatt(&mut self, callback: EventCallback) {
        self.gatt_callback = Some(callback);
    }

    pub fn clear(&mut self) {
        self.gap_callback = None;
        self.gatt_callback = None;
    }

    /// Translate a raw stack event and dispatch it
    pub fn translate(&mut self, event: &StackEvent) -> BleEvent {
        let translated = BleEvent::from_stack(event);
        self.dispatch(&translated);
        translated
    }

    /// Forward an event to the callback for its source
    ///
    /// GATT events go to the GATT callback; everything else to the GAP callback.
    pub fn dispatch(&mut self, event: &BleEvent) {
        let callback = if event.source.is_gatt() {
            self.gatt_callback.as_mut()
        } else {
            self.gap_callback.as_mut()
        };

        match callback {
            Some(cb) => cb(event),
            None => info!(
                "EVT: {:#04x} ({:?}, {:?})",
                event.evt_id, event.source, event.category
            ),
        }
    }
}

impl core::fmt::Debug for EventTranslator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventTranslator")
            .field("gap_callback", &self.gap_callback.is_some())
            .field("gatt_callback", &self.gatt_callback.is_some())
            .finish()
    }
}

/// Log an advertising-state notification
pub fn log_adv_event(event: AdvEvent) {
    match event {
        AdvEvent::Fast => info!("Advertising started"),
        AdvEvent::Idle => info!("Idle. sleep to save power"),
        other => info!("ADV event: {:?}", other),
    }
}

/// Log an asynchronous stack error
pub fn log_stack_error(err: StackError) {
    error!("ERR: {:#x}", err.code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (EventCallback, Arc<Mutex<Vec<BleEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb: EventCallback = Box::new(move |evt| sink.lock().unwrap().push(*evt));
        (cb, seen)
    }

    #[test]
    fn test_classification_table() {
        use EventCategory::*;
        let cases = [
            (evt::GAP_CONNECTED, ConnectionLifecycle),
            (evt::GAP_DISCONNECTED, ConnectionLifecycle),
            (evt::GAP_PHY_UPDATE_REQUEST, ConnectionLifecycle),
            (evt::GAP_SEC_PARAMS_REQUEST, SecurityNegotiation),
            (evt::GAP_AUTH_KEY_REQUEST, SecurityNegotiation),
            (evt::GAP_LESC_DHKEY_REQUEST, SecurityNegotiation),
            (evt::GAP_AUTH_STATUS, SecurityNegotiation),
            (evt::GATTC_TIMEOUT, Timeout),
            (evt::GATTS_TIMEOUT, Timeout),
            (evt::GAP_TIMEOUT, Timeout),
            (0x01, Unrecognized),
            (0x50, Unrecognized),
            (0xFFFF, Unrecognized),
        ];
        for (id, expected) in cases {
            assert_eq!(classify(id), expected, "event {:#x}", id);
        }
    }

    #[test]
    fn test_source_ranges() {
        assert_eq!(EventSource::of(evt::GAP_CONNECTED), EventSource::Gap);
        assert_eq!(EventSource::of(evt::GATTC_TIMEOUT), EventSource::GattClient);
        assert_eq!(EventSource::of(evt::GATTS_TIMEOUT), EventSource::GattServer);
        assert_eq!(EventSource::of(0x01), EventSource::Other);
    }

    #[test]
    fn test_gap_and_gatt_routing() {
        let mut translator = EventTranslator::new();
        let (gap_cb, gap_seen) = recorder();
        let (gatt_cb, gatt_seen) = recorder();
        translator.register_gap(gap_cb);
        translator.register_gatt(gatt_cb);

        translator.translate(&StackEvent::new(evt::GAP_CONNECTED, 3));
        translator.translate(&StackEvent::new(evt::GATTS_TIMEOUT, 3));
        translator.translate(&StackEvent::new(0x01, CONN_HANDLE_INVALID));

        let gap = gap_seen.lock().unwrap();
        assert_eq!(gap.len(), 2);
        assert_eq!(gap[0].category, EventCategory::ConnectionLifecycle);
        assert_eq!(gap[0].conn_handle, Some(3));
        assert_eq!(gap[1].category, EventCategory::Unrecognized);
        assert_eq!(gap[1].conn_handle, None);

        let gatt = gatt_seen.lock().unwrap();
        assert_eq!(gatt.len(), 1);
        assert_eq!(gatt[0].category, EventCategory::Timeout);
    }

    #[test]
    fn test_unregistered_events_are_only_logged() {
        let mut translator = EventTranslator::new();
        let event = translator.translate(&StackEvent::new(evt::GAP_AUTH_STATUS, 0));
        assert_eq!(event.category, EventCategory::SecurityNegotiation);

        let (gap_cb, gap_seen) = recorder();
        translator.register_gap(gap_cb);
        // GATT events with only a GAP callback registered stay log-only
        translator.translate(&StackEvent::new(evt::GATTC_TIMEOUT, 0));
        assert!(gap_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_register_replaces_callback() {
        let mut translator = EventTranslator::new();
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();
        translator.register_gap(first);
        translator.register_gap(second);

        translator.translate(&StackEvent::new(evt::GAP_DISCONNECTED, 1));
        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }
}
