//! Fuzz target for block id parsing.
//!
//! Run with: cargo +nightly fuzz run block_id_fuzz -- -max_total_time=60

#![no_main]

use lifegrid_core::BlockId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Accepted ids must print back to exactly the input.
        if let Ok(id) = BlockId::parse(input) {
            assert_eq!(id.to_string(), input, "parse is not canonical");
            assert_eq!(BlockId::parse(&id.to_string()), Ok(id));
            assert!(id.unit_in_year().map_or(true, |u| u < id.granularity().units_per_year()));
        }
    }
});
