//! Fuzz target for the chat overlay send path.
//!
//! Drives arbitrary send sequences through the overlay. Sends must never
//! panic, rejected sends must leave no state behind, and history must
//! stay within its capacity.

#![no_main]

use agon_chat::{ChatConfig, ChatOverlay};
use agon_realtime::{EventDispatcher, SubscriptionRegistry};
use agon_types::Room;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct ChatOp {
    member: bool,
    match_id: i64,
    text: String,
    valid_sender: bool,
}

fuzz_target!(|ops: Vec<ChatOp>| {
    let registry = Arc::new(SubscriptionRegistry::new());
    let dispatcher = Arc::new(EventDispatcher::new());
    let overlay = ChatOverlay::with_config(
        registry.clone(),
        dispatcher,
        ChatConfig {
            cooldown_ms: 0,
            history_capacity: 4,
            max_text_len: 16,
        },
    );

    // One connection that joined the small match rooms, one that joined
    // nothing.
    for match_id in 1..=4u64 {
        let _ = registry.join("member", &Room::Match(match_id));
    }

    for op in ops {
        let connection_id = if op.member { "member" } else { "outsider" };
        let sender = if op.valid_sender { "0xabc123" } else { "zz" };

        if let Ok(message) = overlay.send(connection_id, op.match_id, &op.text, sender) {
            assert!(message.match_id >= 1);
            assert!(message.text.chars().count() <= 16);
        }
    }

    for match_id in 1..=4 {
        assert!(overlay.history_len(match_id) <= 4);
    }
});
