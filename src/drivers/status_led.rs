//! RGB status LED.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: three LEDC channels at 8-bit resolution, one per colour
//! component, so every palette entry shows as itself.
//! On host/test: [`SimPwm`] channels that remember their duty.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::app::ports::IndicatorPort;
use crate::drivers::indicator::{BLACK, Rgb};

/// Full scale of one colour component.
const COMPONENT_MAX: u16 = 0xFF;

pub struct StatusLed<P> {
    /// Red, green, blue.
    channels: Option<[P; 3]>,
    current: Rgb,
}

impl<P: SetDutyCycle> StatusLed<P> {
    pub fn new(channels: Option<[P; 3]>) -> Self {
        Self {
            channels,
            current: BLACK,
        }
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }

    pub fn channels(&self) -> Option<&[P; 3]> {
        self.channels.as_ref()
    }
}

impl<P: SetDutyCycle> IndicatorPort for StatusLed<P> {
    fn show(&mut self, colour: Rgb) {
        self.current = colour;
        if let Some(channels) = self.channels.as_mut() {
            let (r, g, b) = colour;
            for (channel, level) in channels.iter_mut().zip([r, g, b]) {
                if channel
                    .set_duty_cycle_fraction(u16::from(level), COMPONENT_MAX)
                    .is_err()
                {
                    log::warn!("status LED: duty write failed");
                }
            }
        }
        log::trace!("status LED: {:?}", colour);
    }
}

// ── Host PWM channel ──────────────────────────────────────────

/// Stand-in for one PWM channel with an 8-bit duty range.
#[derive(Debug)]
pub struct SimPwm {
    gpio: u8,
    duty: u16,
}

impl SimPwm {
    pub fn new(gpio: u8) -> Self {
        Self { gpio, duty: 0 }
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        COMPONENT_MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty.min(COMPONENT_MAX);
        Ok(())
    }
}
