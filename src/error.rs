//! Error types for the PinBridge firmware.
//!
//! Two tiers:
//!
//! - **Recoverable** errors ([`TransportError`], [`LinkError`],
//!   [`CommandError`], [`PinWriteError`]) are logged, counted and retried
//!   by whoever owns the operation.  They never leave the component that
//!   produced them.
//! - **Fatal** conditions ([`Fatal`]) end the current boot.  Only the
//!   top-level runtime acts on them, by resetting the device.
//!
//! All variants are `Copy` so they can be passed through the supervisor
//! step results without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Broker transport errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`BrokerPort`](crate::app::ports::BrokerPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// TCP/TLS connection to the broker could not be established.
    ConnectFailed,
    /// Broker answered CONNACK with a non-success return code.
    Refused,
    /// No CONNACK within the connect timeout.
    Timeout,
    /// Operation requires a live session and there is none.
    NotConnected,
    /// The session broke while processing traffic.
    ConnectionLost,
    /// The client refused to queue a request (e.g. request buffer full).
    RequestRejected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::Refused => write!(f, "broker refused connection"),
            Self::Timeout => write!(f, "broker did not answer in time"),
            Self::NotConnected => write!(f, "no broker session"),
            Self::ConnectionLost => write!(f, "broker connection lost"),
            Self::RequestRejected => write!(f, "request rejected by client"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link-layer errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`LinkPort`](crate::app::ports::LinkPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// DHCP lease renewal (or equivalent) failed.
    LeaseFailed,
    /// The controller did not come back from a soft reset.
    ResetFailed,
    /// Generic bus / driver I/O error.
    Io,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeaseFailed => write!(f, "lease maintenance failed"),
            Self::ResetFailed => write!(f, "link reset failed"),
            Self::Io => write!(f, "link I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// A pin command that was rejected without touching any pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Index is outside `[0, pin_count)`.
    PinOutOfRange { index: usize, pin_count: usize },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinOutOfRange { index, pin_count } => {
                write!(f, "pin index {index} out of range (pin count {pin_count})")
            }
        }
    }
}

/// A GPIO line refused a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWriteError {
    pub index: usize,
}

impl fmt::Display for PinWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO write failed on line {}", self.index)
    }
}

// ---------------------------------------------------------------------------
// Fatal conditions
// ---------------------------------------------------------------------------

/// Conditions that end the current boot with a full device reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// The supervisor did not tick the liveness counter for a full window.
    WatchdogStall { ticks: u32, window_secs: u32 },
    /// Graceful disconnect failed and the link controller could not be
    /// soft-reset either.
    LinkResetFailed,
    /// A `boom` command was received.
    RemoteReset,
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WatchdogStall { ticks, window_secs } => write!(
                f,
                "supervisor stuck at tick {ticks} after {window_secs} seconds"
            ),
            Self::LinkResetFailed => write!(f, "link reset failed after failed disconnect"),
            Self::RemoteReset => write!(f, "remote reset requested"),
        }
    }
}
