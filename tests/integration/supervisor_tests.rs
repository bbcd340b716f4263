//! Supervisor loop against scripted broker and link mocks.

use std::time::Duration;

use pinbridge::app::events::BrokerEvent;
use pinbridge::config::DeviceConfig;
use pinbridge::error::{Fatal, LinkError, TransportError};
use pinbridge::state::{Counter, DeviceState};
use pinbridge::supervisor::{Step, Supervisor};

use crate::mock_hw::{MockBroker, MockLink, MockOutputs};

struct Rig {
    sup: Supervisor,
    state: DeviceState,
    broker: MockBroker,
    link: MockLink,
    outputs: MockOutputs,
}

impl Rig {
    fn new(broker: MockBroker) -> Self {
        let config = DeviceConfig::default();
        Self {
            sup: Supervisor::new(&config),
            state: DeviceState::new(config.pin_count()),
            broker,
            link: MockLink::new(),
            outputs: MockOutputs::new(config.pin_count()),
        }
    }

    fn step(&mut self) -> Step {
        self.sup.step(
            &mut self.state,
            &mut self.broker,
            &mut self.link,
            &mut self.outputs,
        )
    }

    fn recover(&mut self) -> Result<(), Fatal> {
        self.sup
            .recover(&mut self.state, &mut self.broker, &mut self.link)
    }
}

// ── Connect ───────────────────────────────────────────────────

#[test]
fn connect_subscribes_everything_and_requests_status() {
    let mut rig = Rig::new(MockBroker::new());

    assert_eq!(rig.step(), Step::Connected);

    assert!(rig.state.is_connected());
    assert_eq!(rig.state.counters.get(Counter::Connect), 1);
    assert!(rig.state.status_pending());
    assert_eq!(rig.broker.subscriptions.len(), 3 + 8);
    for topic in ["pinbridge/boom", "pinbridge/ping", "pinbridge/ports", "pinbridge/7"] {
        assert!(
            rig.broker.subscriptions.iter().any(|t| t == topic),
            "missing {topic}"
        );
    }
}

#[test]
fn failed_connects_back_off_linearly_to_the_cap() {
    let mut rig = Rig::new(MockBroker::new().fail_connects(25));

    let waits: Vec<u64> = (0..25)
        .map(|_| match rig.step() {
            Step::Backoff(d) => d.as_secs(),
            other => panic!("expected backoff, got {other:?}"),
        })
        .collect();

    assert_eq!(&waits[..4], &[0, 1, 2, 3]);
    assert!(waits.windows(2).all(|w| w[0] <= w[1]), "non-decreasing");
    assert_eq!(waits.iter().copied().max(), Some(18));
    assert!(!rig.state.is_connected());
    assert_eq!(rig.state.counters.get(Counter::Connect), 0);

    assert_eq!(rig.step(), Step::Connected);
    assert_eq!(rig.sup.backoff().current(), 0);
}

#[test]
fn lease_failure_is_not_fatal() {
    let mut rig = Rig::new(MockBroker::new());
    rig.link.lease_result = Err(LinkError::LeaseFailed);

    assert_eq!(rig.step(), Step::Connected);
    assert_eq!(rig.step(), Step::Idle(Duration::from_millis(123)));
    assert_eq!(rig.link.leases, 2);
}

// ── Message step ──────────────────────────────────────────────

#[test]
fn quiet_poll_idles() {
    let mut rig = Rig::new(MockBroker::new());
    rig.step();
    assert_eq!(rig.step(), Step::Idle(Duration::from_millis(123)));
}

#[test]
fn pin_message_drives_output() {
    let mut rig = Rig::new(MockBroker::new().then_message("pinbridge/3", "on"));
    rig.step();

    assert_eq!(rig.step(), Step::Active);
    assert_eq!(rig.state.pin(3), Some(true));
    assert_eq!(rig.outputs.writes, vec![(3, true)]);
    assert_eq!(rig.state.counters.get(Counter::Message), 1);
}

#[test]
fn transport_events_bump_counters() {
    let mut rig = Rig::new(
        MockBroker::new()
            .then_event(BrokerEvent::Subscribed)
            .then_event(BrokerEvent::Subscribed)
            .then_event(BrokerEvent::Published),
    );
    rig.step();
    for _ in 0..3 {
        assert_eq!(rig.step(), Step::Active);
    }
    assert_eq!(rig.state.counters.get(Counter::Subscribe), 2);
    assert_eq!(rig.state.counters.get(Counter::Publish), 1);
    assert_eq!(
        rig.state.counters.to_string(),
        "{'connect': 1, 'subscribe': 2, 'publish': 1}"
    );
}

#[test]
fn broker_disconnect_triggers_reconnect_and_new_report() {
    let mut rig = Rig::new(MockBroker::new().then_event(BrokerEvent::Disconnected));
    rig.step();
    assert!(rig.state.status_pending());

    assert_eq!(rig.step(), Step::Active);
    assert!(!rig.state.is_connected());
    assert_eq!(rig.state.counters.get(Counter::Disconnected), 1);

    assert_eq!(rig.step(), Step::Connected);
    assert_eq!(rig.broker.connects, 2);
    assert_eq!(rig.state.counters.get(Counter::Connect), 2);
    assert!(rig.state.status_pending());
}

#[test]
fn boom_ends_the_boot() {
    let mut rig = Rig::new(MockBroker::new().then_message("pinbridge/boom", "now"));
    rig.step();
    assert_eq!(rig.step(), Step::Fatal(Fatal::RemoteReset));
}

// ── Failure path ──────────────────────────────────────────────

#[test]
fn poll_failure_counts_and_asks_for_recovery() {
    let mut rig = Rig::new(MockBroker::new().then_poll_error());
    rig.step();

    assert_eq!(rig.step(), Step::Recover(Duration::from_secs(3)));
    assert_eq!(rig.state.counters.get(Counter::FailLoop), 1);
    assert!(rig.state.is_connected(), "flag only drops in recover()");
}

#[test]
fn recovery_disconnects_gracefully() {
    let mut rig = Rig::new(MockBroker::new().then_poll_error());
    rig.step();
    rig.step();

    assert_eq!(rig.recover(), Ok(()));
    assert!(!rig.state.is_connected());
    assert_eq!(rig.broker.disconnects, 1);
    assert_eq!(rig.state.counters.get(Counter::Disconnected), 1);
    assert_eq!(rig.link.resets, 0);
}

#[test]
fn failed_disconnect_resets_the_link() {
    let mut rig = Rig::new(MockBroker::new().then_poll_error());
    rig.broker.disconnect_result = Err(TransportError::ConnectionLost);
    rig.step();
    rig.step();

    assert_eq!(rig.recover(), Ok(()));
    assert_eq!(rig.link.resets, 1);
    assert_eq!(rig.state.counters.get(Counter::EthReset), 1);
    assert_eq!(rig.state.counters.get(Counter::Disconnected), 0);
    assert!(!rig.state.is_connected());
}

#[test]
fn nonzero_link_reset_status_is_fatal() {
    let mut rig = Rig::new(MockBroker::new().then_poll_error());
    rig.broker.disconnect_result = Err(TransportError::ConnectionLost);
    rig.link.reset_result = Ok(-1);
    rig.step();
    rig.step();

    assert_eq!(rig.recover(), Err(Fatal::LinkResetFailed));
}

#[test]
fn link_reset_error_is_fatal() {
    let mut rig = Rig::new(MockBroker::new().then_poll_error());
    rig.broker.disconnect_result = Err(TransportError::ConnectionLost);
    rig.link.reset_result = Err(LinkError::ResetFailed);
    rig.step();
    rig.step();

    assert_eq!(rig.recover(), Err(Fatal::LinkResetFailed));
}

#[test]
fn recovery_while_disconnected_is_a_noop() {
    let mut rig = Rig::new(
        MockBroker::new()
            .then_event(BrokerEvent::Disconnected)
            .then_poll_error(),
    );
    rig.step();
    rig.step();
    assert!(!rig.state.is_connected());

    assert_eq!(rig.recover(), Ok(()));
    assert_eq!(rig.broker.disconnects, 0);
    assert_eq!(rig.link.resets, 0);
}
