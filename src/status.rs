//! Status reporter: device snapshot published to `{prefix}/status`.
//!
//! Requests are coalesced through the single pending slot in
//! [`DeviceState`]; the reporter consumes the slot only while a session
//! is up, so a request made while offline is served after reconnect.

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{BrokerPort, LinkPort, SystemPort};
use crate::state::{Counter, DeviceState};

/// One status report.  Built, serialised, published, dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub uptime_mins: u32,
    pub ip: String,
    pub ports: String,
    pub counters: String,
    pub mem_free: u32,
}

impl StatusSnapshot {
    pub fn capture(state: &DeviceState, ip: core::net::Ipv4Addr, mem_free: u32) -> Self {
        Self {
            uptime_mins: state.uptime_mins(),
            ip: ip.to_string(),
            ports: state.ports_string().as_str().to_owned(),
            counters: state.counters.to_string(),
            mem_free,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Offline or nothing requested.
    NotDue,
    Sent,
    /// Publishing failed; the request is consumed anyway.
    Failed,
}

pub struct StatusReporter {
    topic: String,
    debug: bool,
}

impl StatusReporter {
    pub fn new(topic: String, debug: bool) -> Self {
        Self { topic, debug }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish a report if one is pending and the session is up.
    pub fn service<B, L, S>(
        &self,
        state: &mut DeviceState,
        broker: &mut B,
        link: &L,
        system: &S,
    ) -> ReportOutcome
    where
        B: BrokerPort,
        L: LinkPort,
        S: SystemPort,
    {
        if !state.is_connected() || !state.take_status_request() {
            return ReportOutcome::NotDue;
        }

        let snapshot = StatusSnapshot::capture(state, link.ip_address(), system.free_memory());
        let json = match snapshot.to_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("status: encode failed: {}", e);
                return ReportOutcome::Failed;
            }
        };

        match broker.publish(&self.topic, json.as_bytes()) {
            Ok(()) => {
                state.counters.inc(Counter::Status);
                if self.debug {
                    info!("status: {}", json);
                } else {
                    debug!("status: sent ({} bytes)", json.len());
                }
                ReportOutcome::Sent
            }
            Err(e) => {
                warn!("status: publish failed: {}", e);
                ReportOutcome::Failed
            }
        }
    }
}
