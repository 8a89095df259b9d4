//! Fuzz target for decoding persisted store envelopes.
//!
//! Run with: cargo +nightly fuzz run envelope_fuzz -- -max_total_time=60

#![no_main]

use lifegrid_storage::{decode_root, encode_root};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either decode or fail with an error, never a panic.
    if let Ok(decoded) = decode_root("fuzz", data) {
        let blob = encode_root("fuzz", &decoded.root).expect("decoded roots re-encode");
        let again = decode_root("fuzz", &blob).expect("encoded roots decode");
        assert_eq!(again.root, decoded.root);
    }
});
