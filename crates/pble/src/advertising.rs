//! Advertising configuration state and its translation into stack parameters
//!
//! The configurator only holds state until `adv_start`; nothing here talks to the
//! stack. [`AdvState::to_params`] and [`AdvState::to_data`] produce the vendor
//! structures submitted when advertising actually starts.

use serde::{Deserialize, Serialize};

use crate::config::BleConfig;
use crate::error::{BleError, BleResult};
use crate::payload::AdvPayload;
use crate::stack::{AdvData, AdvParams, AdvType, GapAddr, ADV_SET_HANDLE_NOT_SET};

/// Interval assigned to both bounds when no other default is configured
pub const DEFAULT_ADV_INTERVAL_MS: u16 = 180;

/// Shortest legal legacy advertising interval
pub const ADV_MIN_INTERVAL_MS: u16 = 20;

/// Longest legal legacy advertising interval
pub const ADV_MAX_INTERVAL_MS: u16 = 10_240;

/// Longest duration the stack's 16-bit, 10 ms timeout field can express
pub const ADV_MAX_DURATION_MS: u32 = u16::MAX as u32 * 10;

const ADV_INTERVAL_UNIT_THOUSANDTH: u32 = 625;
const ADV_DURATION_UNIT_MS: u32 = 10;

// ----------------------------------------------------------------------------
// Advertising Mode
// ----------------------------------------------------------------------------

/// How peers may respond to the advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AdvMode {
    /// ADV_IND
    #[default]
    ConnectableScannableUndirected,
    /// Connectable undirected; legacy PDUs carry this as ADV_IND as well
    ConnectableUndirected,
    /// ADV_DIRECT_IND; needs a peer address set before starting
    ConnectableDirected,
    /// ADV_NONCONN_IND
    NonConnectableUndirected,
    /// ADV_SCAN_IND
    ScannableUndirected,
}

impl AdvMode {
    pub const ALL: [AdvMode; 5] = [
        AdvMode::ConnectableScannableUndirected,
        AdvMode::ConnectableUndirected,
        AdvMode::ConnectableDirected,
        AdvMode::NonConnectableUndirected,
        AdvMode::ScannableUndirected,
    ];

    /// Stack advertising type for this mode
    pub fn adv_type(self) -> AdvType {
        match self {
            Self::ConnectableScannableUndirected | Self::ConnectableUndirected => {
                AdvType::ConnectableScannableUndirected
            }
            Self::ConnectableDirected => AdvType::ConnectableNonscannableDirected,
            Self::NonConnectableUndirected => AdvType::NonconnectableNonscannableUndirected,
            Self::ScannableUndirected => AdvType::NonconnectableScannableUndirected,
        }
    }
}

// ----------------------------------------------------------------------------
// Unit Conversion and Validation
// ----------------------------------------------------------------------------

/// Convert milliseconds to 0.625 ms interval units, truncating
pub fn interval_to_units(ms: u16) -> u32 {
    u32::from(ms) * 1000 / ADV_INTERVAL_UNIT_THOUSANDTH
}

/// Convert milliseconds to 10 ms duration units, truncating; 0 stays "forever"
pub fn duration_to_units(ms: u32) -> u16 {
    // validate_duration bounds the value, so the quotient fits.
    (ms.min(ADV_MAX_DURATION_MS) / ADV_DURATION_UNIT_MS) as u16
}

/// Check interval bounds against the link layer's legal range
pub fn validate_interval(min_ms: u16, max_ms: u16) -> BleResult<()> {
    if min_ms < ADV_MIN_INTERVAL_MS || max_ms > ADV_MAX_INTERVAL_MS {
        return Err(BleError::invalid_configuration(format!(
            "advertising interval {}..{} ms outside {}..{} ms",
            min_ms, max_ms, ADV_MIN_INTERVAL_MS, ADV_MAX_INTERVAL_MS
        )));
    }
    if min_ms > max_ms {
        return Err(BleError::invalid_configuration(format!(
            "advertising interval minimum {} ms exceeds maximum {} ms",
            min_ms, max_ms
        )));
    }
    Ok(())
}

/// Check a duration fits the stack's timeout field
pub fn validate_duration(ms: u32) -> BleResult<()> {
    if ms > ADV_MAX_DURATION_MS {
        return Err(BleError::invalid_configuration(format!(
            "advertising duration {} ms exceeds {} ms",
            ms, ADV_MAX_DURATION_MS
        )));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Advertising State
// ----------------------------------------------------------------------------

/// Advertising sub-state owned by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvState {
    pub mode: AdvMode,
    pub min_ms: u16,
    pub max_ms: u16,
    /// 0 advertises until explicitly stopped
    pub duration_ms: u32,
    pub payload: AdvPayload,
    pub scan_response: AdvPayload,
    /// Peer for directed advertising
    pub peer: Option<GapAddr>,
    /// Vendor advertising set, allocated on first start
    pub set: AdvSet,
}

impl AdvState {
    /// Fresh state for `mode` with the configured interval and duration
    pub fn new(mode: AdvMode, config: &BleConfig) -> Self {
        Self {
            mode,
            min_ms: config.adv_interval_ms,
            max_ms: config.adv_interval_ms,
            duration_ms: config.adv_duration_ms,
            payload: AdvPayload::new(),
            scan_response: AdvPayload::new(),
            peer: None,
            set: AdvSet::default(),
        }
    }

    /// Stack parameters for the current mode, interval and duration
    ///
    /// The stack takes a single interval; the minimum bound is submitted. The peer
    /// address only goes out with directed types.
    pub fn to_params(&self) -> AdvParams {
        let adv_type = self.mode.adv_type();
        AdvParams {
            adv_type,
            interval: interval_to_units(self.min_ms),
            duration: duration_to_units(self.duration_ms),
            peer_addr: self.peer.filter(|_| adv_type.is_directed()),
        }
    }

    /// Copies of the held payloads for the stack's buffers
    pub fn to_data(&self) -> AdvData {
        AdvData {
            adv_data: self.payload,
            scan_rsp_data: self.scan_response,
        }
    }
}

impl Default for AdvState {
    fn default() -> Self {
        Self::new(AdvMode::default(), &BleConfig::default())
    }
}

/// Vendor-side view of the advertising set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvSet {
    /// Stack handle, [`ADV_SET_HANDLE_NOT_SET`] until first configured
    pub handle: u8,
    /// Last parameters submitted to the stack
    pub params: Option<AdvParams>,
    /// Stack-visible copies of the payloads
    pub data: AdvData,
}

impl AdvSet {
    pub fn is_allocated(&self) -> bool {
        self.handle != ADV_SET_HANDLE_NOT_SET
    }
}

impl Default for AdvSet {
    fn default() -> Self {
        Self {
            handle: ADV_SET_HANDLE_NOT_SET,
            params: None,
            data: AdvData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_mapping() {
        let t = AdvMode::ConnectableScannableUndirected.adv_type();
        assert!(t.is_connectable() && t.is_scannable() && !t.is_directed());

        let t = AdvMode::ConnectableDirected.adv_type();
        assert!(t.is_connectable() && !t.is_scannable() && t.is_directed());

        let t = AdvMode::NonConnectableUndirected.adv_type();
        assert!(!t.is_connectable() && !t.is_scannable() && !t.is_directed());

        let t = AdvMode::ScannableUndirected.adv_type();
        assert!(!t.is_connectable() && t.is_scannable() && !t.is_directed());

        assert_eq!(
            AdvMode::ConnectableUndirected.adv_type(),
            AdvType::ConnectableScannableUndirected
        );
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(interval_to_units(180), 288);
        assert_eq!(interval_to_units(20), 32);
        assert_eq!(interval_to_units(10_240), 16_384);
        // 101 ms = 161.6 units, truncated
        assert_eq!(interval_to_units(101), 161);

        assert_eq!(duration_to_units(0), 0);
        assert_eq!(duration_to_units(30_000), 3_000);
        assert_eq!(duration_to_units(15), 1);
        assert_eq!(duration_to_units(ADV_MAX_DURATION_MS), u16::MAX);
    }

    #[test]
    fn test_interval_validation() {
        assert!(validate_interval(20, 10_240).is_ok());
        assert!(validate_interval(100, 100).is_ok());
        assert!(validate_interval(19, 100).is_err());
        assert!(validate_interval(100, 10_241).is_err());
        assert!(validate_interval(200, 100).is_err());
    }

    #[test]
    fn test_state_defaults_and_params() {
        let state = AdvState::new(AdvMode::ScannableUndirected, &BleConfig::default());
        assert_eq!(state.min_ms, 180);
        assert_eq!(state.max_ms, 180);
        assert_eq!(state.duration_ms, 0);
        assert!(state.payload.is_empty());
        assert!(!state.set.is_allocated());

        let params = state.to_params();
        assert_eq!(params.adv_type, AdvType::NonconnectableScannableUndirected);
        assert_eq!(params.interval, 288);
        assert_eq!(params.duration, 0);
        assert!(params.peer_addr.is_none());
    }

    #[test]
    fn test_peer_only_sent_when_directed() {
        let peer = GapAddr {
            addr_type: crate::stack::GapAddrType::Public,
            addr: [1, 2, 3, 4, 5, 6],
        };
        let mut state = AdvState::new(AdvMode::ConnectableDirected, &BleConfig::default());
        assert!(state.to_params().peer_addr.is_none());

        state.peer = Some(peer);
        assert_eq!(state.to_params().peer_addr, Some(peer));

        state.mode = AdvMode::ConnectableScannableUndirected;
        assert!(state.to_params().peer_addr.is_none());
    }
}
