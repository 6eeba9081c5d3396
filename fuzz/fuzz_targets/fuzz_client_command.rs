//! Fuzz target for the WebSocket wire protocol.
//!
//! Tests that command and event frame parsing handle arbitrary input
//! without panicking.

#![no_main]

use agon_gateway::protocol::{ClientCommand, EventFrame, ServerMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<ClientCommand>(text);
        let _ = serde_json::from_str::<ServerMessage>(text);
        let _ = serde_json::from_str::<EventFrame>(text);
    }

    // Also try with lossy conversion (includes invalid UTF-8 bytes as replacement chars)
    let lossy = String::from_utf8_lossy(data);
    let _ = serde_json::from_str::<ClientCommand>(&lossy);
});
