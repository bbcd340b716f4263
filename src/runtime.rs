//! Cooperative runtime: one boot of the device.
//!
//! All tasks share one thread, driven by an `edge-executor` local
//! executor with `async-io-mini` reactor timers:
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on                                      │
//!  │  ┌────────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                          │  │
//!  │  │                                                        │  │
//!  │  │  supervise ─┐                                          │  │
//!  │  │             ├─ first Fatal ends the run                │  │
//!  │  │  liveness ──┘                                          │  │
//!  │  │                                                        │  │
//!  │  │  reporter · status timer · uptime · indicator          │  │
//!  │  └────────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shared resources sit in `RefCell`s and are only borrowed between
//! suspension points, never across an `.await`.

use core::cell::RefCell;
use core::time::Duration;

use async_io_mini::Timer;
use log::{error, info};

use crate::app::ports::{BrokerPort, IndicatorPort, LinkPort, OutputBank, SystemPort};
use crate::config::DeviceConfig;
use crate::drivers::indicator::IndicatorCycle;
use crate::drivers::watchdog::Watchdog;
use crate::error::Fatal;
use crate::liveness::LivenessWatchdog;
use crate::state::DeviceState;
use crate::status::StatusReporter;
use crate::supervisor::{Step, Supervisor};

/// The adapters one boot runs against.
pub struct Device<B, L, O, S, I> {
    pub broker: B,
    pub link: L,
    pub outputs: O,
    pub system: S,
    pub indicator: I,
}

/// What is left after a boot ended.  On hardware `run` never gets this
/// far because the restart does not return.
pub struct Halt<B, L, O, S, I> {
    pub fatal: Fatal,
    pub state: DeviceState,
    pub device: Device<B, L, O, S, I>,
}

// ── Tasks ─────────────────────────────────────────────────────

async fn supervise<B, L, O>(
    mut supervisor: Supervisor,
    state: &RefCell<DeviceState>,
    broker: &RefCell<B>,
    link: &RefCell<L>,
    outputs: &mut O,
    watchdog: Watchdog,
) -> Fatal
where
    B: BrokerPort,
    L: LinkPort,
    O: OutputBank,
{
    loop {
        state.borrow_mut().tick_watchdog();
        watchdog.feed();
        futures_lite::future::yield_now().await;

        let step = supervisor.step(
            &mut state.borrow_mut(),
            &mut *broker.borrow_mut(),
            &mut *link.borrow_mut(),
            outputs,
        );

        match step {
            Step::Connected | Step::Active => {}
            Step::Backoff(wait) | Step::Idle(wait) => {
                Timer::after(wait).await;
            }
            Step::Recover(wait) => {
                Timer::after(wait).await;
                let recovered = supervisor.recover(
                    &mut state.borrow_mut(),
                    &mut *broker.borrow_mut(),
                    &mut *link.borrow_mut(),
                );
                if let Err(fatal) = recovered {
                    return fatal;
                }
            }
            Step::Fatal(fatal) => return fatal,
        }
    }
}

async fn watch_liveness(
    mut watchdog: LivenessWatchdog,
    state: &RefCell<DeviceState>,
    window: Duration,
) -> Fatal {
    loop {
        watchdog.begin_window(&state.borrow());
        Timer::after(window).await;
        if let Some(fatal) = watchdog.check(&mut state.borrow_mut()) {
            return fatal;
        }
    }
}

async fn report_status<B, L, S>(
    reporter: StatusReporter,
    state: &RefCell<DeviceState>,
    broker: &RefCell<B>,
    link: &RefCell<L>,
    system: &S,
    poll: Duration,
) where
    B: BrokerPort,
    L: LinkPort,
    S: SystemPort,
{
    loop {
        reporter.service(
            &mut state.borrow_mut(),
            &mut *broker.borrow_mut(),
            &*link.borrow(),
            system,
        );
        Timer::after(poll).await;
    }
}

async fn schedule_status(state: &RefCell<DeviceState>, interval: Duration) {
    loop {
        Timer::after(interval).await;
        state.borrow_mut().request_status();
    }
}

async fn count_uptime(state: &RefCell<DeviceState>, tick: Duration) {
    loop {
        Timer::after(tick).await;
        state.borrow_mut().bump_uptime();
    }
}

async fn drive_indicator<I: IndicatorPort>(
    state: &RefCell<DeviceState>,
    indicator: &mut I,
    period: Duration,
) {
    let mut cycle = IndicatorCycle::new();
    loop {
        let connected = state.borrow().is_connected();
        indicator.show(cycle.advance(connected));
        Timer::after(period).await;
    }
}

// ── Entry ─────────────────────────────────────────────────────

/// Run one boot until a fatal condition, wait the reset grace period,
/// then restart through the [`SystemPort`].
pub fn run<B, L, O, S, I>(
    config: &DeviceConfig,
    device: Device<B, L, O, S, I>,
) -> Halt<B, L, O, S, I>
where
    B: BrokerPort,
    L: LinkPort,
    O: OutputBank,
    S: SystemPort,
    I: IndicatorPort,
{
    let timing = &config.timing;
    let Device {
        broker,
        link,
        mut outputs,
        mut system,
        mut indicator,
    } = device;

    let state = RefCell::new(DeviceState::new(config.pin_count()));
    let broker = RefCell::new(broker);
    let link = RefCell::new(link);

    let fatal = {
        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

        let reporter = StatusReporter::new(config.status_topic(), config.debug);
        executor
            .spawn(report_status(
                reporter,
                &state,
                &broker,
                &link,
                &system,
                timing.reporter_poll(),
            ))
            .detach();
        executor
            .spawn(schedule_status(&state, timing.status_interval()))
            .detach();
        executor
            .spawn(count_uptime(&state, timing.uptime_tick()))
            .detach();
        executor
            .spawn(drive_indicator(&state, &mut indicator, timing.indicator_period()))
            .detach();

        let supervisor = supervise(
            Supervisor::new(config),
            &state,
            &broker,
            &link,
            &mut outputs,
            Watchdog::new(timing.hw_watchdog_secs),
        );
        let liveness = watch_liveness(
            LivenessWatchdog::new(timing.watchdog_window_secs),
            &state,
            timing.watchdog_window(),
        );

        info!(
            "runtime: started ({} pins, prefix '{}')",
            config.pin_count(),
            config.topic_prefix
        );

        let grace = timing.reset_grace();
        futures_lite::future::block_on(executor.run(async {
            let fatal = futures_lite::future::or(supervisor, liveness).await;
            error!("runtime: {} (reset in {}s)", fatal, grace.as_secs());
            Timer::after(grace).await;
            fatal
        }))
    };

    system.restart(fatal);

    Halt {
        fatal,
        state: state.into_inner(),
        device: Device {
            broker: broker.into_inner(),
            link: link.into_inner(),
            outputs,
            system,
            indicator,
        },
    }
}
