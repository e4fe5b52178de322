//! Device configuration

use serde::{Deserialize, Serialize};

use crate::advertising::{validate_duration, validate_interval, DEFAULT_ADV_INTERVAL_MS};
use crate::error::{BleError, BleResult};
use crate::stack::DEFAULT_PRIVATE_ADDR_CYCLE_INTERVAL_S;

/// Longest device name the GAP service accepts
pub const DEVICE_NAME_MAX_LEN: usize = 248;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for a BLE device backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// GAP device name set during bring-up
    pub device_name: String,
    /// Interval applied to both bounds by `adv_init`, in milliseconds
    pub adv_interval_ms: u16,
    /// Duration applied by `adv_init`, in milliseconds (0 = forever)
    pub adv_duration_ms: u32,
    /// Connection configuration tag passed to the stack
    pub conn_cfg_tag: u8,
    /// Dispatch priority of the stack event observer
    pub observer_priority: u8,
    /// Private address rotation period, in seconds
    pub private_addr_cycle_s: u16,
    /// Whether to resubmit advertising after a peer disconnects
    pub restart_on_disconnect: bool,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            device_name: "pble".to_string(),
            adv_interval_ms: DEFAULT_ADV_INTERVAL_MS,
            adv_duration_ms: 0,
            conn_cfg_tag: 1,
            observer_priority: 3,
            private_addr_cycle_s: DEFAULT_PRIVATE_ADDR_CYCLE_INTERVAL_S,
            restart_on_disconnect: false,
        }
    }
}

impl BleConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GAP device name
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the default advertising interval
    pub fn with_adv_interval_ms(mut self, interval_ms: u16) -> Self {
        self.adv_interval_ms = interval_ms;
        self
    }

    /// Set the default advertising duration
    pub fn with_adv_duration_ms(mut self, duration_ms: u32) -> Self {
        self.adv_duration_ms = duration_ms;
        self
    }

    /// Set the connection configuration tag
    pub fn with_conn_cfg_tag(mut self, tag: u8) -> Self {
        self.conn_cfg_tag = tag;
        self
    }

    /// Set the observer priority
    pub fn with_observer_priority(mut self, priority: u8) -> Self {
        self.observer_priority = priority;
        self
    }

    /// Set the private address rotation period
    pub fn with_private_addr_cycle_s(mut self, seconds: u16) -> Self {
        self.private_addr_cycle_s = seconds;
        self
    }

    /// Enable or disable advertising restart after a disconnect
    pub fn with_restart_on_disconnect(mut self, enabled: bool) -> Self {
        self.restart_on_disconnect = enabled;
        self
    }

    /// Check the configuration against the stack's limits
    pub fn validate(&self) -> BleResult<()> {
        if self.device_name.is_empty() {
            return Err(BleError::invalid_configuration("device name is empty"));
        }
        if self.device_name.len() > DEVICE_NAME_MAX_LEN {
            return Err(BleError::invalid_configuration(format!(
                "device name is {} bytes (max: {})",
                self.device_name.len(),
                DEVICE_NAME_MAX_LEN
            )));
        }
        // Tag 0 is the stack's built-in default configuration.
        if self.conn_cfg_tag == 0 {
            return Err(BleError::invalid_configuration(
                "connection configuration tag 0 is reserved",
            ));
        }
        if self.private_addr_cycle_s == 0 {
            return Err(BleError::invalid_configuration(
                "private address cycle interval must be non-zero",
            ));
        }
        validate_interval(self.adv_interval_ms, self.adv_interval_ms)?;
        validate_duration(self.adv_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BleConfig::default();
        assert_eq!(config.adv_interval_ms, 180);
        assert_eq!(config.adv_duration_ms, 0);
        assert_eq!(config.conn_cfg_tag, 1);
        assert_eq!(config.observer_priority, 3);
        assert!(!config.restart_on_disconnect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = BleConfig::new()
            .with_device_name("sensor")
            .with_adv_interval_ms(100)
            .with_adv_duration_ms(30_000)
            .with_restart_on_disconnect(true);
        assert_eq!(config.device_name, "sensor");
        assert_eq!(config.adv_interval_ms, 100);
        assert_eq!(config.adv_duration_ms, 30_000);
        assert!(config.restart_on_disconnect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(BleConfig::new().with_device_name("").validate().is_err());
        assert!(BleConfig::new()
            .with_device_name("x".repeat(249))
            .validate()
            .is_err());
        assert!(BleConfig::new().with_conn_cfg_tag(0).validate().is_err());
        assert!(BleConfig::new().with_adv_interval_ms(19).validate().is_err());
        assert!(BleConfig::new()
            .with_adv_duration_ms(1_000_000)
            .validate()
            .is_err());
        assert!(BleConfig::new()
            .with_private_addr_cycle_s(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: BleConfig =
            serde_json::from_str(r#"{ "device_name": "beacon", "adv_interval_ms": 1000 }"#)
                .unwrap();
        assert_eq!(config.device_name, "beacon");
        assert_eq!(config.adv_interval_ms, 1000);
        assert_eq!(config.conn_cfg_tag, 1);
        assert_eq!(config.private_addr_cycle_s, 900);
    }
}
