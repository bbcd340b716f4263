//! Mock adapters for integration tests.
//!
//! Each mock records every call and replays scripted results, so tests
//! can drive the supervisor, reporter and runtime without a broker,
//! network or GPIO.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::Duration;

use pinbridge::app::events::BrokerEvent;
use pinbridge::app::ports::{BrokerPort, IndicatorPort, LinkPort, OutputBank, SystemPort};
use pinbridge::drivers::indicator::Rgb;
use pinbridge::error::{Fatal, LinkError, PinWriteError, TransportError};

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    /// Results of successive `connect` calls; `Ok` once exhausted.
    pub connect_script: VecDeque<Result<(), TransportError>>,
    /// Results of successive `poll` calls; `Ok(None)` once exhausted.
    pub poll_script: VecDeque<Result<Option<BrokerEvent>, TransportError>>,
    pub disconnect_result: Result<(), TransportError>,
    pub publish_result: Result<(), TransportError>,
    pub connects: u32,
    pub disconnects: u32,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    /// Once this many publishes went out and the poll script is empty,
    /// every poll delivers a message on the given topic.
    pub message_after_publishes: Option<(usize, String)>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            connect_script: VecDeque::new(),
            poll_script: VecDeque::new(),
            disconnect_result: Ok(()),
            publish_result: Ok(()),
            connects: 0,
            disconnects: 0,
            subscriptions: Vec::new(),
            published: Vec::new(),
            message_after_publishes: None,
        }
    }

    pub fn fail_connects(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.connect_script.push_back(Err(TransportError::ConnectFailed));
        }
        self
    }

    pub fn then_event(mut self, event: BrokerEvent) -> Self {
        self.poll_script.push_back(Ok(Some(event)));
        self
    }

    pub fn then_message(self, topic: &str, payload: &str) -> Self {
        self.then_event(BrokerEvent::Message {
            topic: topic.into(),
            payload: payload.into(),
        })
    }

    pub fn message_once_published(mut self, publishes: usize, topic: &str) -> Self {
        self.message_after_publishes = Some((publishes, topic.to_owned()));
        self
    }

    pub fn then_poll_error(mut self) -> Self {
        self.poll_script.push_back(Err(TransportError::ConnectionLost));
        self
    }

    pub fn published_on(&self, topic: &str) -> Vec<&[u8]> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_slice())
            .collect()
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerPort for MockBroker {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connects += 1;
        self.subscriptions.clear();
        self.connect_script.pop_front().unwrap_or(Ok(()))
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.disconnects += 1;
        self.disconnect_result
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.publish_result?;
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Option<BrokerEvent>, TransportError> {
        if let Some(scripted) = self.poll_script.pop_front() {
            return scripted;
        }
        match &self.message_after_publishes {
            Some((n, topic)) if self.published.len() >= *n => Ok(Some(BrokerEvent::Message {
                topic: topic.clone(),
                payload: String::new(),
            })),
            _ => Ok(None),
        }
    }
}

// ── MockLink ──────────────────────────────────────────────────

pub struct MockLink {
    pub lease_result: Result<(), LinkError>,
    pub reset_result: Result<i32, LinkError>,
    pub leases: u32,
    pub resets: u32,
    pub ip: Ipv4Addr,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            lease_result: Ok(()),
            reset_result: Ok(0),
            leases: 0,
            resets: 0,
            ip: Ipv4Addr::new(192, 168, 4, 20),
        }
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkPort for MockLink {
    fn maintain_lease(&mut self) -> Result<(), LinkError> {
        self.leases += 1;
        self.lease_result
    }

    fn soft_reset(&mut self) -> Result<i32, LinkError> {
        self.resets += 1;
        self.reset_result
    }

    fn ip_address(&self) -> Ipv4Addr {
        self.ip
    }
}

// ── MockOutputs ───────────────────────────────────────────────

pub struct MockOutputs {
    pub levels: Vec<bool>,
    pub writes: Vec<(usize, bool)>,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new(lines: usize) -> Self {
        Self {
            levels: vec![false; lines],
            writes: Vec::new(),
            fail: false,
        }
    }
}

impl OutputBank for MockOutputs {
    fn line_count(&self) -> usize {
        self.levels.len()
    }

    fn write(&mut self, index: usize, level: bool) -> Result<(), PinWriteError> {
        if self.fail || index >= self.levels.len() {
            return Err(PinWriteError { index });
        }
        self.levels[index] = level;
        self.writes.push((index, level));
        Ok(())
    }
}

// ── MockSystem ────────────────────────────────────────────────

pub struct MockSystem {
    pub free: u32,
    pub restarts: Vec<Fatal>,
}

#[allow(dead_code)]
impl MockSystem {
    pub fn new() -> Self {
        Self {
            free: 48_000,
            restarts: Vec::new(),
        }
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPort for MockSystem {
    fn free_memory(&self) -> u32 {
        self.free
    }

    fn restart(&mut self, reason: Fatal) {
        self.restarts.push(reason);
    }
}

// ── MockIndicator ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockIndicator {
    pub shown: Vec<Rgb>,
}

impl IndicatorPort for MockIndicator {
    fn show(&mut self, colour: Rgb) {
        self.shown.push(colour);
    }
}
