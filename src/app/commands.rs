//! Inbound commands and the topic → command binding.
//!
//! The table is rebuilt on every successful connect because the broker
//! does not keep subscriptions across sessions.  It is the only source of
//! truth for which topics the device answers to.

use crate::state::MAX_PINS;

/// Capacity of the binding table: ping, ports, boom, one per pin.
pub const MAX_BINDINGS: usize = MAX_PINS + 3;

/// Commands the outside world can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Publish a status report as soon as possible.
    Ping,
    /// Set every pin from a one-character-per-pin string.
    Ports,
    /// Reset the device.
    Boom,
    /// Set a single pin.
    Pin(usize),
}

#[derive(Debug, Default)]
pub struct TopicTable {
    bindings: heapless::Vec<(String, Route), MAX_BINDINGS>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every binding with the standard set under `prefix`.
    pub fn bind_all(&mut self, prefix: &str, pin_count: usize) {
        self.bindings.clear();
        self.bind(format!("{prefix}/boom"), Route::Boom);
        self.bind(format!("{prefix}/ping"), Route::Ping);
        self.bind(format!("{prefix}/ports"), Route::Ports);
        for index in 0..pin_count.min(MAX_PINS) {
            self.bind(format!("{prefix}/{index}"), Route::Pin(index));
        }
    }

    fn bind(&mut self, topic: String, route: Route) {
        if self.bindings.push((topic, route)).is_err() {
            log::warn!("router: binding table full, dropping {:?}", route);
        }
    }

    /// Exact-match lookup; unknown topics resolve to `None`.
    pub fn resolve(&self, topic: &str) -> Option<Route> {
        self.bindings
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, r)| *r)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
