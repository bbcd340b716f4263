//! Whole boots on the real executor, with delays shortened to zero where
//! the test does not depend on them.

use std::time::{Duration, Instant};

use pinbridge::config::DeviceConfig;
use pinbridge::error::{Fatal, TransportError};
use pinbridge::runtime::{self, Device};
use pinbridge::state::Counter;

use crate::mock_hw::{MockBroker, MockIndicator, MockLink, MockOutputs, MockSystem};

fn fast_config() -> DeviceConfig {
    let mut config = DeviceConfig {
        topic_prefix: "bench".into(),
        ..DeviceConfig::default()
    };
    config.pins.truncate(3);
    config.timing.reset_grace_secs = 0;
    config.timing.fail_loop_delay_secs = 0;
    config.timing.idle_delay_ms = 1;
    config.timing.reporter_poll_ms = 1;
    config
}

fn device(broker: MockBroker) -> Device<MockBroker, MockLink, MockOutputs, MockSystem, MockIndicator> {
    Device {
        broker,
        link: MockLink::new(),
        outputs: MockOutputs::new(3),
        system: MockSystem::new(),
        indicator: MockIndicator::default(),
    }
}

#[test]
fn boom_resets_after_handling_earlier_commands() {
    let config = fast_config();
    let broker = MockBroker::new()
        .fail_connects(2)
        .then_message("bench/1", "on")
        .then_message("bench/boom", "");

    let halt = runtime::run(&config, device(broker));

    assert_eq!(halt.fatal, Fatal::RemoteReset);
    assert_eq!(halt.device.system.restarts, vec![Fatal::RemoteReset]);
    assert_eq!(halt.state.ports_string().as_str(), "010");
    assert_eq!(halt.device.outputs.writes, vec![(1, true)]);
    assert_eq!(halt.device.broker.connects, 3);
    assert_eq!(halt.device.broker.subscriptions.len(), 6);
    assert_eq!(halt.state.counters.get(Counter::Message), 1);
}

#[test]
fn unrecoverable_link_is_fatal() {
    let config = fast_config();
    let mut broker = MockBroker::new().then_poll_error();
    broker.disconnect_result = Err(TransportError::ConnectionLost);
    let mut dev = device(broker);
    dev.link.reset_result = Ok(3);

    let halt = runtime::run(&config, dev);

    assert_eq!(halt.fatal, Fatal::LinkResetFailed);
    assert_eq!(halt.state.counters.get(Counter::FailLoop), 1);
    assert_eq!(halt.state.counters.get(Counter::EthReset), 1);
    assert_eq!(halt.device.link.resets, 1);
    assert_eq!(halt.device.system.restarts.len(), 1);
}

#[test]
fn status_timer_publishes_again_without_a_ping() {
    let mut config = fast_config();
    config.timing.status_interval_secs = 1;
    // The second report is what ends the boot.
    let broker = MockBroker::new().message_once_published(2, "bench/boom");

    let started = Instant::now();
    let halt = runtime::run(&config, device(broker));

    assert_eq!(halt.fatal, Fatal::RemoteReset);
    assert!(started.elapsed() >= Duration::from_secs(1));
    let reports = halt.device.broker.published_on(&config.status_topic());
    assert_eq!(reports.len(), 2);
    assert_eq!(halt.device.broker.connects, 1);
    assert_eq!(halt.state.counters.get(Counter::Status), 2);
}

#[test]
fn supervisor_parked_past_the_window_is_a_watchdog_stall() {
    let mut config = fast_config();
    // A fail-loop sleep longer than the liveness window; `validate` rejects
    // this, `run` takes it as given.
    config.timing.watchdog_window_secs = 1;
    config.timing.fail_loop_delay_secs = 3;
    let broker = MockBroker::new().then_poll_error();

    let halt = runtime::run(&config, device(broker));

    assert_eq!(
        halt.fatal,
        Fatal::WatchdogStall {
            ticks: 0,
            window_secs: 1
        }
    );
    assert_eq!(halt.device.system.restarts, vec![halt.fatal]);
    assert_eq!(halt.state.counters.get(Counter::FailLoop), 1);
    // Still asleep when the window closed: recovery never ran.
    assert_eq!(halt.device.broker.disconnects, 0);
}
