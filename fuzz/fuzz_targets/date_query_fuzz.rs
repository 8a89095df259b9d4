//! Fuzz target for date query parsing and lookup.
//!
//! Run with: cargo +nightly fuzz run date_query_fuzz -- -max_total_time=60

#![no_main]

use lifegrid_core::{DateQuery, Date, Horizon};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(query) = DateQuery::parse(input) else {
        return;
    };

    let first_day = query.first_day();
    assert!(first_day.is_some(), "accepted query {:?} has no first day", input);

    if let Some(dob) = Date::from_ymd_opt(1990, 5, 17) {
        if let Some(id) = query.locate(dob, Horizon::default()) {
            assert_eq!(id.granularity(), query.granularity());
            let (start, end) = id
                .period(dob, Horizon::default())
                .expect("located id lies inside the horizon");
            let day = first_day.expect("checked above");
            assert!(start <= day && day < end);
        }
    }
});
