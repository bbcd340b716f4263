//! Connection supervisor: keeps the broker session alive.
//!
//! One call to [`Supervisor::step`] is one iteration of the supervisor
//! loop minus its sleeps.  The returned [`Step`] tells the async runtime
//! how long to wait before the next call, so everything here runs
//! synchronously against mocks.
//!
//! ```text
//!           ┌──────── connect fails ────────┐
//!           ▼                               │
//!   ┌──────────────┐   connect ok   ┌───────┴──────┐
//!   │ Disconnected ├───────────────▶│  Connected   │
//!   └──────────────┘                └───────┬──────┘
//!           ▲        poll fails:            │
//!           └──── fail_loop + recover ──────┘
//! ```

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::app::events::BrokerEvent;
use crate::app::ports::{BrokerPort, LinkPort, OutputBank};
use crate::app::router::CommandRouter;
use crate::config::{DeviceConfig, TimingConfig};
use crate::error::{Fatal, TransportError};
use crate::state::{Counter, DeviceState};

// ---------------------------------------------------------------------------
// Reconnect backoff
// ---------------------------------------------------------------------------

/// Linear reconnect backoff: 0, 1, 2, … seconds, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    delay_secs: u32,
    cap_secs: u32,
}

impl Backoff {
    pub const fn new(cap_secs: u32) -> Self {
        Self {
            delay_secs: 0,
            cap_secs,
        }
    }

    /// Delay to wait after this failure.  The next one waits a second
    /// longer, up to the cap.
    pub fn on_failure(&mut self) -> Duration {
        let wait = self.delay_secs;
        self.delay_secs = (self.delay_secs + 1).min(self.cap_secs);
        Duration::from_secs(u64::from(wait))
    }

    pub fn reset(&mut self) {
        self.delay_secs = 0;
    }

    pub fn current(&self) -> u32 {
        self.delay_secs
    }
}

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

/// What the runtime should do after one supervisor iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Session established; loop again immediately.
    Connected,
    /// Connect failed; sleep, then loop.
    Backoff(Duration),
    /// An event was handled; loop again immediately.
    Active,
    /// Nothing arrived within the bounded wait; sleep, then loop.
    Idle(Duration),
    /// The message step failed; sleep, then call [`Supervisor::recover`].
    Recover(Duration),
    /// End the boot.
    Fatal(Fatal),
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct Supervisor {
    router: CommandRouter,
    backoff: Backoff,
    prefix: String,
    timing: TimingConfig,
}

impl Supervisor {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            router: CommandRouter::new(&config.pins),
            backoff: Backoff::new(config.timing.backoff_cap_secs),
            prefix: config.topic_prefix.clone(),
            timing: config.timing.clone(),
        }
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// One loop iteration after the watchdog tick and the yield.
    pub fn step<B, L, O>(
        &mut self,
        state: &mut DeviceState,
        broker: &mut B,
        link: &mut L,
        outputs: &mut O,
    ) -> Step
    where
        B: BrokerPort,
        L: LinkPort,
        O: OutputBank,
    {
        if let Err(e) = link.maintain_lease() {
            warn!("supervisor: {}", e);
        }

        if !state.is_connected() {
            return match self.connect(state, broker) {
                Ok(()) => Step::Connected,
                Err(e) => {
                    let wait = self.backoff.on_failure();
                    warn!("supervisor: {} (retry in {}s)", e, wait.as_secs());
                    Step::Backoff(wait)
                }
            };
        }

        match broker.poll(self.timing.loop_timeout()) {
            Ok(Some(event)) => match self.dispatch(state, outputs, event) {
                Ok(()) => Step::Active,
                Err(fatal) => Step::Fatal(fatal),
            },
            Ok(None) => Step::Idle(self.timing.idle_delay()),
            Err(e) => {
                error!("supervisor: message loop failed: {}", e);
                state.counters.inc(Counter::FailLoop);
                Step::Recover(self.timing.fail_loop_delay())
            }
        }
    }

    fn connect<B: BrokerPort>(
        &mut self,
        state: &mut DeviceState,
        broker: &mut B,
    ) -> Result<(), TransportError> {
        info!("supervisor: connecting");
        broker.connect()?;

        self.router.rebind(&self.prefix);
        for topic in self.router.topics() {
            broker.subscribe(topic)?;
            debug!("supervisor: subscribe {}", topic);
        }

        self.backoff.reset();
        state.set_connected(true);
        state.counters.inc(Counter::Connect);
        state.request_status();
        info!("supervisor: connected");
        Ok(())
    }

    /// Apply one transport event to the device.
    pub fn dispatch<O: OutputBank>(
        &self,
        state: &mut DeviceState,
        outputs: &mut O,
        event: BrokerEvent,
    ) -> Result<(), Fatal> {
        match event {
            BrokerEvent::Message { topic, payload } => {
                debug!("supervisor: message {} <- {:?}", topic, payload);
                self.router
                    .route_message(state, outputs, &topic, &payload)
                    .map(|_| ())
            }
            BrokerEvent::Subscribed => {
                state.counters.inc(Counter::Subscribe);
                Ok(())
            }
            BrokerEvent::Published => {
                state.counters.inc(Counter::Publish);
                Ok(())
            }
            BrokerEvent::Disconnected => {
                info!("supervisor: broker closed the session");
                state.set_connected(false);
                state.counters.inc(Counter::Disconnected);
                Ok(())
            }
        }
    }

    /// Second half of the failure path, run after the fail-loop delay.
    ///
    /// Tries a graceful disconnect; if even that fails the link
    /// controller is soft-reset, and a reset that does not report `0` is
    /// fatal.
    pub fn recover<B, L>(
        &mut self,
        state: &mut DeviceState,
        broker: &mut B,
        link: &mut L,
    ) -> Result<(), Fatal>
    where
        B: BrokerPort,
        L: LinkPort,
    {
        if !state.is_connected() {
            return Ok(());
        }
        state.set_connected(false);

        match broker.disconnect() {
            Ok(()) => {
                info!("supervisor: disconnected");
                state.counters.inc(Counter::Disconnected);
                Ok(())
            }
            Err(e) => {
                warn!("supervisor: disconnect failed ({}), resetting link", e);
                state.counters.inc(Counter::EthReset);
                match link.soft_reset() {
                    Ok(0) => {
                        info!("supervisor: link reset");
                        Ok(())
                    }
                    Ok(code) => {
                        error!("supervisor: link reset returned {}", code);
                        Err(Fatal::LinkResetFailed)
                    }
                    Err(e) => {
                        error!("supervisor: {}", e);
                        Err(Fatal::LinkResetFailed)
                    }
                }
            }
        }
    }
}
