//! Command router: inbound (topic, payload) to handler.
//!
//! Owns the [`TopicTable`] and the physical line labels used in
//! transition logs.  Every handled message bumps the `message` counter
//! after its handler ran; unknown topics are dropped silently.

use log::{debug, info, warn};

use crate::error::Fatal;
use crate::state::{Counter, DeviceState, MAX_PINS};

use super::commands::{Route, TopicTable};
use super::interpreter::{self, PinChange};
use super::ports::OutputBank;

pub struct CommandRouter {
    table: TopicTable,
    labels: heapless::Vec<u8, MAX_PINS>,
}

impl CommandRouter {
    /// `labels[i]` is the GPIO number behind pin index `i`.
    pub fn new(labels: &[u8]) -> Self {
        let mut own = heapless::Vec::new();
        for &l in labels.iter().take(MAX_PINS) {
            let _ = own.push(l);
        }
        Self {
            table: TopicTable::new(),
            labels: own,
        }
    }

    /// Rebuild the binding table for a fresh session.
    pub fn rebind(&mut self, prefix: &str) {
        self.table.bind_all(prefix, self.labels.len());
        debug!("router: {} topics bound under '{}'", self.table.len(), prefix);
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.table.topics()
    }

    /// Handle one inbound message.
    ///
    /// Returns `Ok(true)` if the topic was bound, `Ok(false)` if it was
    /// ignored.  `Err` only for `boom`.
    pub fn route_message<O: OutputBank>(
        &self,
        state: &mut DeviceState,
        outputs: &mut O,
        topic: &str,
        payload: &str,
    ) -> Result<bool, Fatal> {
        let Some(route) = self.table.resolve(topic) else {
            debug!("router: ignoring '{}'", topic);
            return Ok(false);
        };

        match route {
            Route::Ping => {
                if !state.request_status() {
                    debug!("router: ping while a report is already pending");
                }
            }
            Route::Ports => {
                for change in interpreter::apply_bulk(state, payload) {
                    self.drive(outputs, change);
                }
            }
            Route::Pin(index) => match interpreter::apply_single(state, index, payload) {
                Ok(Some(change)) => self.drive(outputs, change),
                Ok(None) => debug!("router: empty payload for pin {}", index),
                Err(e) => warn!("router: {}", e),
            },
            Route::Boom => {
                // Unauthenticated: any client that can publish here can
                // reset the device.
                warn!("router: boom received on '{}', resetting", topic);
                return Err(Fatal::RemoteReset);
            }
        }

        state.counters.inc(Counter::Message);
        Ok(true)
    }

    fn drive<O: OutputBank>(&self, outputs: &mut O, change: PinChange) {
        let gpio = self.labels.get(change.index).copied().unwrap_or(u8::MAX);
        info!(
            "pin {} (GPIO {}): {} -> {}",
            change.index,
            gpio,
            u8::from(change.from),
            u8::from(change.to)
        );
        if let Err(e) = outputs.write(change.index, change.to) {
            warn!("router: {}", e);
        }
    }
}
