//! Liveness watchdog over the supervisor tick counter.
//!
//! The supervisor bumps [`DeviceState::watchdog_ticks`] on every
//! iteration.  Once per window the watchdog compares the counter with its
//! value at the start of the window: progress clears it, no progress is a
//! stall.  A stall is reported once and the watchdog stays
//! [`Liveness::Stalled`] from then on.

use log::{debug, error};

use crate::error::Fatal;
use crate::state::DeviceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Healthy,
    Stalled,
}

#[derive(Debug)]
pub struct LivenessWatchdog {
    window_secs: u32,
    baseline: u32,
    status: Liveness,
}

impl LivenessWatchdog {
    pub fn new(window_secs: u32) -> Self {
        Self {
            window_secs,
            baseline: 0,
            status: Liveness::Healthy,
        }
    }

    pub fn status(&self) -> Liveness {
        self.status
    }

    /// Record the counter at the start of a window.
    pub fn begin_window(&mut self, state: &DeviceState) {
        self.baseline = state.watchdog_ticks();
    }

    /// Close the current window.  Returns the fatal condition the first
    /// time a stall is seen, `None` otherwise.
    pub fn check(&mut self, state: &mut DeviceState) -> Option<Fatal> {
        if self.status == Liveness::Stalled {
            return None;
        }

        let ticks = state.watchdog_ticks();
        if ticks == self.baseline {
            self.status = Liveness::Stalled;
            error!(
                "watchdog: no supervisor progress in {}s (tick {})",
                self.window_secs, ticks
            );
            return Some(Fatal::WatchdogStall {
                ticks,
                window_secs: self.window_secs,
            });
        }

        debug!("watchdog: {} ticks this window", ticks.wrapping_sub(self.baseline));
        state.clear_watchdog_ticks();
        self.baseline = 0;
        None
    }
}
