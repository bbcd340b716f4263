//! Fuzz target: `CommandRouter::route_message`
//!
//! Splits the input at the first NUL into topic and payload and routes it
//! through a router bound under `fz`.  Unbound topics must never change
//! state; only `fz/boom` may return a fatal condition.
//!
//! cargo fuzz run fuzz_topic_router

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinbridge::app::ports::OutputBank;
use pinbridge::app::router::CommandRouter;
use pinbridge::error::{Fatal, PinWriteError};
use pinbridge::state::{Counter, DeviceState};

struct Sink(usize);

impl OutputBank for Sink {
    fn line_count(&self) -> usize {
        self.0
    }

    fn write(&mut self, index: usize, _level: bool) -> Result<(), PinWriteError> {
        assert!(index < self.0, "write past the last line");
        Ok(())
    }
}

const LABELS: [u8; 6] = [4, 5, 12, 13, 14, 15];

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let topic = String::from_utf8_lossy(&data[..split]);
    let payload = String::from_utf8_lossy(data.get(split + 1..).unwrap_or_default());

    let mut router = CommandRouter::new(&LABELS);
    router.rebind("fz");
    let mut state = DeviceState::new(LABELS.len());
    let mut sink = Sink(LABELS.len());

    match router.route_message(&mut state, &mut sink, &topic, &payload) {
        Ok(true) => assert_eq!(state.counters.get(Counter::Message), 1),
        Ok(false) => {
            assert_eq!(state.ports_string().as_str(), "000000");
            assert_eq!(state.counters.get(Counter::Message), 0);
            assert!(!state.status_pending());
        }
        Err(fatal) => {
            assert_eq!(fatal, Fatal::RemoteReset);
            assert_eq!(topic, "fz/boom");
        }
    }
});
