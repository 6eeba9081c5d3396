//! Fuzz target for canonical room name parsing.
//!
//! Tests that the room parser handles arbitrary input without panicking
//! and that every name it accepts round-trips through its canonical form.

#![no_main]

use agon_types::Room;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(room) = Room::parse(s) {
            let canonical = room.name();
            let reparsed = Room::parse(&canonical).expect("canonical name must parse");
            assert_eq!(reparsed.name(), canonical);
        }
    }
});
