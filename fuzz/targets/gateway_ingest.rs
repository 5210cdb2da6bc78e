#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use evgate::{EventBroker, Gateway, GatewayConfig};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    history_capacity: u8,
    max_envelope_size: u16,
    frames: Vec<Vec<u8>>,
}

fuzz_target!(|input: FuzzInput| {
    let broker = Arc::new(EventBroker::with_capacity(input.history_capacity as usize));
    let gateway = Gateway::new(
        broker.clone(),
        GatewayConfig {
            max_envelope_size: input.max_envelope_size as usize,
        },
    );

    let mut accepted = 0u64;
    for frame in &input.frames {
        if gateway.on_event(frame) {
            accepted += 1;
        }
    }

    let stats = broker.stats();
    assert_eq!(stats.dispatched, accepted);
    assert_eq!(
        stats.decode_failures + stats.oversize_dropped + accepted,
        input.frames.len() as u64
    );
    assert!(broker.history_len() <= broker.history_capacity());
});
