//! Fuzz target: pin command interpreter
//!
//! Feeds arbitrary text to the single-pin and bulk interpreters and checks
//! that the pin count never changes, out-of-range indices never mutate,
//! and bulk commands only touch pins addressed by `0`, `1` or `!`.
//!
//! cargo fuzz run fuzz_pin_commands

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinbridge::app::interpreter;
use pinbridge::state::{DeviceState, MAX_PINS};

fuzz_target!(|data: &[u8]| {
    let Some((&head, rest)) = data.split_first() else {
        return;
    };
    let pin_count = usize::from(head) % MAX_PINS + 1;
    let text = String::from_utf8_lossy(rest);

    let mut state = DeviceState::new(pin_count);
    let before = state.pins().to_vec();

    // Single pin, index from the second byte (may be out of range).
    let index = rest.first().map_or(0, |&b| usize::from(b) % (MAX_PINS * 2));
    match interpreter::apply_single(&mut state, index, &text) {
        Ok(_) => assert_eq!(state.pin_count(), pin_count),
        Err(_) => assert_eq!(state.pins(), before.as_slice()),
    }

    let snapshot = state.pins().to_vec();
    let changes = interpreter::apply_bulk(&mut state, &text);
    assert!(changes.len() <= pin_count);
    for (i, c) in text.chars().take(pin_count).enumerate() {
        if !matches!(c, '0' | '1' | '!') {
            assert_eq!(state.pin(i), Some(snapshot[i]));
        }
    }
    assert_eq!(state.ports_string().len(), pin_count);
});
