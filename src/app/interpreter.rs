//! Pin command interpreter: payload text to pin transitions.
//!
//! Pure decision logic over [`DeviceState`].  Nothing here touches GPIO;
//! the router writes every returned [`PinChange`] to the output bank.

use crate::error::CommandError;
use crate::state::{DeviceState, MAX_PINS};

/// Words that switch a pin on.  Matched case-insensitively.
const TRUTHY: [&str; 9] = ["1", "yes", "yeah", "yay", "yup", "y", "on", "up", "go"];

/// Words that invert a pin.  Matched case-insensitively.
const TOGGLE: [&str; 6] = ["!", "not", "flip", "other", "reverse", "change"];

/// What a single-pin payload asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    On,
    Off,
    Toggle,
}

impl PinAction {
    /// Anything that is neither truthy nor a toggle word means off.
    /// The payload is compared as-is: surrounding whitespace is part of
    /// the word, so `" on"` is not truthy.
    pub fn classify(payload: &str) -> Self {
        if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(payload)) {
            Self::On
        } else if TOGGLE.iter().any(|t| t.eq_ignore_ascii_case(payload)) {
            Self::Toggle
        } else {
            Self::Off
        }
    }

    fn resolve(self, current: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Toggle => !current,
        }
    }
}

/// One applied pin transition.  `from == to` is possible (e.g. "on" on a
/// pin that is already on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinChange {
    pub index: usize,
    pub from: bool,
    pub to: bool,
}

/// Apply a single-pin command.
///
/// An empty payload is a no-op and returns `Ok(None)` before the index is
/// even looked at.  An out-of-range index is rejected with no mutation.
pub fn apply_single(
    state: &mut DeviceState,
    index: usize,
    payload: &str,
) -> Result<Option<PinChange>, CommandError> {
    if payload.is_empty() {
        return Ok(None);
    }
    let from = state.pin(index).ok_or(CommandError::PinOutOfRange {
        index,
        pin_count: state.pin_count(),
    })?;
    let to = PinAction::classify(payload).resolve(from);
    state.set_pin(index, to)?;
    Ok(Some(PinChange { index, from, to }))
}

/// Apply a bulk command, one character per pin in index order.
///
/// `'1'` sets, `'0'` clears, `'!'` inverts.  Any other character leaves
/// its pin alone.  Characters past the last pin are ignored and a short
/// payload leaves the trailing pins untouched.
pub fn apply_bulk(state: &mut DeviceState, payload: &str) -> heapless::Vec<PinChange, MAX_PINS> {
    let mut changes = heapless::Vec::new();
    for (index, ch) in payload.chars().take(state.pin_count()).enumerate() {
        let action = match ch {
            '1' => PinAction::On,
            '0' => PinAction::Off,
            '!' => PinAction::Toggle,
            _ => continue,
        };
        let Some(from) = state.pin(index) else {
            break;
        };
        let to = action.resolve(from);
        if state.set_pin(index, to).is_ok() {
            // At most pin_count <= MAX_PINS entries.
            let _ = changes.push(PinChange { index, from, to });
        }
    }
    changes
}
