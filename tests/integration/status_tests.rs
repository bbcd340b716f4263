//! Status reporter: gating, coalescing and failure handling.

use pinbridge::config::DeviceConfig;
use pinbridge::error::TransportError;
use pinbridge::state::{Counter, DeviceState};
use pinbridge::status::{ReportOutcome, StatusReporter};
use pinbridge::supervisor::{Step, Supervisor};

use crate::mock_hw::{MockBroker, MockLink, MockOutputs, MockSystem};

const TOPIC: &str = "pinbridge/status";

/// Connected state with the connect-time report request still pending.
fn connected() -> (DeviceState, MockBroker, MockLink) {
    let config = DeviceConfig::default();
    let mut sup = Supervisor::new(&config);
    let mut state = DeviceState::new(config.pin_count());
    let mut broker = MockBroker::new();
    let mut link = MockLink::new();
    let mut out = MockOutputs::new(config.pin_count());
    assert_eq!(
        sup.step(&mut state, &mut broker, &mut link, &mut out),
        Step::Connected
    );
    (state, broker, link)
}

#[test]
fn offline_request_waits_for_connection() {
    let reporter = StatusReporter::new(TOPIC.into(), false);
    let mut state = DeviceState::new(2);
    let mut broker = MockBroker::new();
    let link = MockLink::new();
    let sys = MockSystem::new();

    assert!(state.request_status());
    assert_eq!(
        reporter.service(&mut state, &mut broker, &link, &sys),
        ReportOutcome::NotDue
    );
    assert!(state.status_pending(), "request survives while offline");
    assert!(broker.published.is_empty());
}

#[test]
fn connect_report_carries_snapshot() {
    let reporter = StatusReporter::new(TOPIC.into(), true);
    let (mut state, mut broker, link) = connected();
    let sys = MockSystem::new();

    assert_eq!(
        reporter.service(&mut state, &mut broker, &link, &sys),
        ReportOutcome::Sent
    );

    let sent = broker.published_on(TOPIC);
    assert_eq!(sent.len(), 1);
    let doc: serde_json::Value = serde_json::from_slice(sent[0]).unwrap();
    assert_eq!(doc["ip"], "192.168.4.20");
    assert_eq!(doc["ports"], "00000000");
    assert_eq!(doc["counters"], "{'connect': 1}");
    assert_eq!(doc["mem_free"], 48_000);
    assert_eq!(doc["uptime_mins"], 0);
    assert_eq!(state.counters.get(Counter::Status), 1);
}

#[test]
fn two_requests_before_service_yield_one_report() {
    let reporter = StatusReporter::new(TOPIC.into(), false);
    let (mut state, mut broker, link) = connected();
    let sys = MockSystem::new();

    state.request_status();
    state.request_status();
    reporter.service(&mut state, &mut broker, &link, &sys);
    assert_eq!(
        reporter.service(&mut state, &mut broker, &link, &sys),
        ReportOutcome::NotDue
    );
    assert_eq!(broker.published_on(TOPIC).len(), 1);
}

#[test]
fn publish_failure_is_swallowed() {
    let reporter = StatusReporter::new(TOPIC.into(), false);
    let (mut state, mut broker, link) = connected();
    broker.publish_result = Err(TransportError::RequestRejected);
    let sys = MockSystem::new();

    assert_eq!(
        reporter.service(&mut state, &mut broker, &link, &sys),
        ReportOutcome::Failed
    );
    assert!(!state.status_pending());
    assert_eq!(state.counters.get(Counter::Status), 0);
}
