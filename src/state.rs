//! Device state: the single mutable record every component works on.
//!
//! One [`DeviceState`] exists per boot.  The runtime owns it and lends it
//! to each task between suspension points; nothing else holds a copy.
//!
//! Mutation rights:
//! - connection flag, watchdog ticks: the connection supervisor only;
//! - pin values: the command router's handlers;
//! - counters: supervisor and router;
//! - pending-status flag: anyone may request, only the reporter consumes.

use core::fmt;

use crate::error::CommandError;

/// Upper bound on output lines a board may expose.
pub const MAX_PINS: usize = 16;

// ───────────────────────────────────────────────────────────────
// Counters
// ───────────────────────────────────────────────────────────────

/// Diagnostic counters published in every status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Counter {
    Connect = 0,
    Disconnected = 1,
    Subscribe = 2,
    Publish = 3,
    Message = 4,
    Status = 5,
    FailLoop = 6,
    EthReset = 7,
}

impl Counter {
    pub const COUNT: usize = 8;

    pub const ALL: [Counter; Self::COUNT] = [
        Self::Connect,
        Self::Disconnected,
        Self::Subscribe,
        Self::Publish,
        Self::Message,
        Self::Status,
        Self::FailLoop,
        Self::EthReset,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnected => "disconnected",
            Self::Subscribe => "subscribe",
            Self::Publish => "publish",
            Self::Message => "message",
            Self::Status => "status",
            Self::FailLoop => "fail_loop",
            Self::EthReset => "eth_reset",
        }
    }
}

/// Fixed table of named counters.  Wraps on overflow.
///
/// Remembers the order in which counters first fired; the display string
/// lists them in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    values: [u32; Counter::COUNT],
    fired: heapless::Vec<Counter, { Counter::COUNT }>,
}

impl Counters {
    pub fn inc(&mut self, counter: Counter) {
        if !self.fired.contains(&counter) {
            // One entry per variant, capacity is COUNT.
            let _ = self.fired.push(counter);
        }
        let slot = &mut self.values[counter as usize];
        *slot = slot.wrapping_add(1);
    }

    pub fn get(&self, counter: Counter) -> u32 {
        self.values[counter as usize]
    }

    /// Counters that have fired at least once, in the order they first fired.
    pub fn iter_fired(&self) -> impl Iterator<Item = (Counter, u32)> + '_ {
        self.fired.iter().map(|&c| (c, self.get(c)))
    }
}

/// Renders as `{'connect': 1, 'subscribe': 11}`; `{}` when nothing fired.
impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (counter, value)) in self.iter_fired().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", counter.name(), value)?;
        }
        f.write_str("}")
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceState
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeviceState {
    connected: bool,
    pins: heapless::Vec<bool, MAX_PINS>,
    pub counters: Counters,
    uptime_mins: u32,
    watchdog_ticks: u32,
    status_pending: bool,
}

impl DeviceState {
    /// All pins start low.  `pin_count` is clamped to [`MAX_PINS`].
    pub fn new(pin_count: usize) -> Self {
        let mut pins = heapless::Vec::new();
        for _ in 0..pin_count.min(MAX_PINS) {
            let _ = pins.push(false);
        }
        Self {
            connected: false,
            pins,
            counters: Counters::default(),
            uptime_mins: 0,
            watchdog_ticks: 0,
            status_pending: false,
        }
    }

    // ── Connection ────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    // ── Pins ──────────────────────────────────────────────────

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn pins(&self) -> &[bool] {
        &self.pins
    }

    pub fn pin(&self, index: usize) -> Option<bool> {
        self.pins.get(index).copied()
    }

    /// Set one pin; out-of-range indices are rejected untouched.
    pub fn set_pin(&mut self, index: usize, value: bool) -> Result<(), CommandError> {
        let pin_count = self.pins.len();
        let slot = self
            .pins
            .get_mut(index)
            .ok_or(CommandError::PinOutOfRange { index, pin_count })?;
        *slot = value;
        Ok(())
    }

    /// One `'1'`/`'0'` per pin in index order.
    pub fn ports_string(&self) -> heapless::String<MAX_PINS> {
        let mut s = heapless::String::new();
        for &on in &self.pins {
            let _ = s.push(if on { '1' } else { '0' });
        }
        s
    }

    // ── Uptime / liveness ─────────────────────────────────────

    pub fn uptime_mins(&self) -> u32 {
        self.uptime_mins
    }

    pub fn bump_uptime(&mut self) {
        self.uptime_mins = self.uptime_mins.saturating_add(1);
    }

    pub fn watchdog_ticks(&self) -> u32 {
        self.watchdog_ticks
    }

    pub(crate) fn tick_watchdog(&mut self) {
        self.watchdog_ticks = self.watchdog_ticks.wrapping_add(1);
    }

    pub(crate) fn clear_watchdog_ticks(&mut self) {
        self.watchdog_ticks = 0;
    }

    // ── Status request slot ───────────────────────────────────

    /// Ask for a status report.  Returns `false` if one was already
    /// pending; the request is dropped, not queued.
    pub fn request_status(&mut self) -> bool {
        if self.status_pending {
            return false;
        }
        self.status_pending = true;
        true
    }

    pub fn status_pending(&self) -> bool {
        self.status_pending
    }

    /// Consume the pending request, if any.
    pub(crate) fn take_status_request(&mut self) -> bool {
        core::mem::take(&mut self.status_pending)
    }
}
