#![no_main]

use libfuzzer_sys::fuzz_target;
use rustzw_core::FrameBuffer;

fuzz_target!(|data: &[u8]| {
    let mut frames = FrameBuffer::new();
    for chunk in data.chunks(7) {
        frames.push(chunk);
        while frames.next_inbound().is_some() {}
    }
    frames.discard_partial();
    assert!(frames.len() <= data.len());
    assert!(frames.dropped_bytes() <= data.len());
});
