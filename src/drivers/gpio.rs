//! Output line bank over `embedded-hal` digital pins.
//!
//! [`GpioBank`] adapts any set of `OutputPin`s to the
//! [`OutputBank`] port.  [`SimLine`] is the host stand-in: it remembers
//! its level and logs every change.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};

use crate::app::ports::OutputBank;
use crate::error::PinWriteError;
use crate::state::MAX_PINS;

pub struct GpioBank<P> {
    lines: heapless::Vec<P, MAX_PINS>,
}

impl<P: OutputPin> GpioBank<P> {
    /// Lines beyond [`MAX_PINS`] are dropped.
    pub fn new(lines: impl IntoIterator<Item = P>) -> Self {
        let mut bank = heapless::Vec::new();
        for line in lines.into_iter().take(MAX_PINS) {
            let _ = bank.push(line);
        }
        Self { lines: bank }
    }

    /// Drive every line low.  Called once at boot, before the first
    /// command can arrive.
    pub fn all_low(&mut self) {
        for index in 0..self.lines.len() {
            if let Err(e) = self.write(index, false) {
                log::warn!("gpio: {}", e);
            }
        }
    }

    pub fn line(&self, index: usize) -> Option<&P> {
        self.lines.get(index)
    }
}

impl<P: OutputPin> OutputBank for GpioBank<P> {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn write(&mut self, index: usize, level: bool) -> Result<(), PinWriteError> {
        let line = self.lines.get_mut(index).ok_or(PinWriteError { index })?;
        line.set_state(PinState::from(level))
            .map_err(|_| PinWriteError { index })
    }
}

// ── Host line ─────────────────────────────────────────────────

/// In-memory output line labelled with its GPIO number.
#[derive(Debug, Clone)]
pub struct SimLine {
    gpio: u8,
    high: bool,
}

impl SimLine {
    pub fn new(gpio: u8) -> Self {
        Self { gpio, high: false }
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            log::debug!("GPIO{}(sim): low", self.gpio);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            log::debug!("GPIO{}(sim): high", self.gpio);
        }
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for SimLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}
