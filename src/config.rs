//! Device configuration
//!
//! Broker credentials, topic namespace, pin assignment and every timing
//! constant of the connection policy.  Loaded from a JSON document at boot;
//! anything missing falls back to [`Default`].

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::device_id::{self, MacAddress};
use crate::state::MAX_PINS;

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Broker ---
    /// Broker hostname or IPv4 address
    pub broker_host: String,
    /// Broker TCP port
    pub broker_port: u16,
    /// Broker username; empty means anonymous
    pub broker_user: String,
    /// Broker password; empty means none
    pub broker_pass: String,
    /// MQTT client id; derived from the MAC when absent
    pub client_id: Option<String>,

    // --- Identity ---
    /// MAC address handed to the Ethernet controller
    pub mac: MacAddress,
    /// Namespace every topic lives under (no trailing slash)
    pub topic_prefix: String,

    // --- Outputs ---
    /// Physical GPIO number of each output line, in index order
    pub pins: heapless::Vec<u8, MAX_PINS>,
    /// Red, green and blue GPIOs of the status LED; none on boards without one
    pub status_led: Option<[u8; 3]>,

    // --- Diagnostics ---
    /// Log every status report in full
    pub debug: bool,

    // --- Timing ---
    pub timing: TimingConfig,
}

/// Delays, windows and caps of the connection and reporting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bounded wait of one transport message step (milliseconds)
    pub loop_timeout_ms: u32,
    /// Pause after a message step with no activity (milliseconds)
    pub idle_delay_ms: u32,
    /// Pause before handling a message-loop failure (seconds)
    pub fail_loop_delay_secs: u32,
    /// Ceiling of the reconnect backoff (seconds)
    pub backoff_cap_secs: u32,
    /// Periodic status report interval (seconds)
    pub status_interval_secs: u32,
    /// Reporter re-check interval while idle or disconnected (milliseconds)
    pub reporter_poll_ms: u32,
    /// Liveness watchdog window (seconds)
    pub watchdog_window_secs: u32,
    /// Delay between a fatal condition and the device reset (seconds)
    pub reset_grace_secs: u32,
    /// Uptime counter resolution (seconds)
    pub uptime_tick_secs: u32,
    /// Status indicator frame period (milliseconds)
    pub indicator_period_ms: u32,
    /// Broker CONNACK timeout (seconds)
    pub connect_timeout_secs: u32,
    /// SoC task watchdog timeout (seconds)
    pub hw_watchdog_secs: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loop_timeout_ms: 200,
            idle_delay_ms: 123,
            fail_loop_delay_secs: 3,
            backoff_cap_secs: 18,
            status_interval_secs: 610, // 10 min 10 s
            reporter_poll_ms: 1000,
            watchdog_window_secs: 60,
            reset_grace_secs: 5,
            uptime_tick_secs: 60,
            indicator_period_ms: 1000,
            connect_timeout_secs: 10,
            hw_watchdog_secs: 120,
        }
    }
}

impl TimingConfig {
    pub fn loop_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.loop_timeout_ms))
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.idle_delay_ms))
    }

    pub fn fail_loop_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.fail_loop_delay_secs))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.status_interval_secs))
    }

    pub fn reporter_poll(&self) -> Duration {
        Duration::from_millis(u64::from(self.reporter_poll_ms))
    }

    pub fn watchdog_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.watchdog_window_secs))
    }

    pub fn reset_grace(&self) -> Duration {
        Duration::from_secs(u64::from(self.reset_grace_secs))
    }

    pub fn uptime_tick(&self) -> Duration {
        Duration::from_secs(u64::from(self.uptime_tick_secs))
    }

    pub fn indicator_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.indicator_period_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut pins = heapless::Vec::new();
        // Eight relay lines on the default carrier board.
        for gpio in [21, 22, 5, 6, 9, 11, 12, 13] {
            let _ = pins.push(gpio);
        }

        Self {
            broker_host: "localhost".into(),
            broker_port: 1883,
            broker_user: String::new(),
            broker_pass: String::new(),
            client_id: None,
            mac: device_id::read_mac(),
            topic_prefix: "pinbridge".into(),
            pins,
            status_led: Some([25, 26, 27]),
            debug: false,
            timing: TimingConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors while loading or validating a [`DeviceConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// No config document at the given location.
    NotFound,
    /// The document is not valid JSON for this schema.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error reading the document.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading / validation
// ---------------------------------------------------------------------------

impl DeviceConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            log::warn!("config: parse error at line {}: {}", e.line(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the config file at `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        Self::from_json(&text)
    }

    /// Reject values the supervisor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_host is empty"));
        }
        if self.pins.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one pin is required"));
        }
        if self.topic_prefix.is_empty() || self.topic_prefix.ends_with('/') {
            return Err(ConfigError::ValidationFailed(
                "topic_prefix must be non-empty without a trailing slash",
            ));
        }
        if self.topic_prefix.contains(['#', '+']) {
            return Err(ConfigError::ValidationFailed(
                "topic_prefix must not contain MQTT wildcards",
            ));
        }

        let t = &self.timing;
        if t.loop_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_timeout_ms must be > 0"));
        }
        if t.watchdog_window_secs == 0 {
            return Err(ConfigError::ValidationFailed("watchdog_window_secs must be > 0"));
        }
        if u64::from(t.loop_timeout_ms) >= u64::from(t.watchdog_window_secs) * 1000 {
            return Err(ConfigError::ValidationFailed(
                "loop_timeout_ms must be shorter than the watchdog window",
            ));
        }
        // The supervisor does not tick while it sleeps, so no single sleep
        // may span a whole liveness window.
        if t.backoff_cap_secs >= t.watchdog_window_secs {
            return Err(ConfigError::ValidationFailed(
                "backoff_cap_secs must be shorter than the watchdog window",
            ));
        }
        if t.fail_loop_delay_secs >= t.watchdog_window_secs {
            return Err(ConfigError::ValidationFailed(
                "fail_loop_delay_secs must be shorter than the watchdog window",
            ));
        }
        if t.status_interval_secs == 0 || t.uptime_tick_secs == 0 {
            return Err(ConfigError::ValidationFailed("timer intervals must be > 0"));
        }
        if t.reporter_poll_ms == 0 || t.indicator_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll periods must be > 0"));
        }
        Ok(())
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// `None` when the username is empty (anonymous login).
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.broker_user.is_empty() {
            None
        } else {
            Some((self.broker_user.as_str(), self.broker_pass.as_str()))
        }
    }

    pub fn client_id(&self) -> String {
        match &self.client_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => device_id::client_id(&self.mac).as_str().to_owned(),
        }
    }

    /// Full topic for `suffix` under the configured namespace.
    pub fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix, suffix)
    }

    pub fn status_topic(&self) -> String {
        self.topic("status")
    }
}
