//! Output lines, status indicator and SoC watchdog.

pub mod gpio;
pub mod indicator;
pub mod status_led;
pub mod watchdog;
