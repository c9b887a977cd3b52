#![no_main]

use libfuzzer_sys::fuzz_target;
use rustzw_core::Frame;

fuzz_target!(|data: &[u8]| {
    if let Ok((frame, used)) = Frame::decode(data) {
        assert!(used <= data.len());
        let encoded = frame.to_vec().expect("decoded frame re-encodes");
        assert_eq!(&encoded[..], &data[..used]);
    }
});
