//! Port traits: the hexagonal boundary between the core and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor / Router / Reporter
//! ```
//!
//! Driven adapters (broker client, Ethernet controller, GPIO bank, SoC
//! services, status LED) implement these traits.  The core consumes them
//! via generics, so nothing in `app`, `supervisor`, `status` or
//! `liveness` touches hardware directly.
//!
//! ## Error policy
//!
//! - Broker and link errors are **recoverable**: the caller logs, counts
//!   and retries.  An adapter must never panic on a dead socket.
//! - Only [`SystemPort::restart`] ends a boot.

use core::net::Ipv4Addr;
use core::time::Duration;

use crate::drivers::indicator::Rgb;
use crate::error::{Fatal, LinkError, PinWriteError, TransportError};

use super::events::BrokerEvent;

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: core ↔ MQTT client)
// ───────────────────────────────────────────────────────────────

/// Publish/subscribe client.  Wire encoding and delivery guarantees
/// belong to the implementation.
pub trait BrokerPort {
    /// Open a fresh session and wait for the broker to accept it.
    /// Any previous session is discarded; subscriptions do not survive.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the session gracefully.
    fn disconnect(&mut self) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Run one message-processing step, blocking for at most `timeout`.
    ///
    /// `Ok(None)` means nothing happened.  `Err` means the session is
    /// broken and the caller must run its recovery path.
    fn poll(&mut self, timeout: Duration) -> Result<Option<BrokerEvent>, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: core ↔ Ethernet controller)
// ───────────────────────────────────────────────────────────────

/// Link layer beneath the broker connection (Ethernet PHY + DHCP).
pub trait LinkPort {
    /// Keep the address lease alive.  Called once per supervisor iteration;
    /// the implementation decides when a renewal is actually due.
    fn maintain_lease(&mut self) -> Result<(), LinkError>;

    /// Soft-reset the controller.  `Ok(0)` is the only success status.
    fn soft_reset(&mut self) -> Result<i32, LinkError>;

    /// Currently assigned address (`0.0.0.0` before the first lease).
    fn ip_address(&self) -> Ipv4Addr;
}

// ───────────────────────────────────────────────────────────────
// Output bank (driven adapter: core → GPIO lines)
// ───────────────────────────────────────────────────────────────

/// The digital output lines under remote control, index-addressed.
pub trait OutputBank {
    fn line_count(&self) -> usize;

    /// Drive line `index` high (`true`) or low.
    fn write(&mut self, index: usize, level: bool) -> Result<(), PinWriteError>;
}

// ───────────────────────────────────────────────────────────────
// System port (driven adapter: core → SoC services)
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Free heap in bytes.
    fn free_memory(&self) -> u32;

    /// Full device reset.  On hardware this never returns.
    fn restart(&mut self, reason: Fatal);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: core → status LED)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn show(&mut self, colour: Rgb);
}
