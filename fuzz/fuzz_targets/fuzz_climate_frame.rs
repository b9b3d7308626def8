//! Fuzz target: DHT11 `decode_frame`
//!
//! Any 5-byte frame either fails the checksum or decodes to finite
//! readings with humidity inside its range (or unavailable).  Never a NaN.
//!
//! cargo fuzz run fuzz_climate_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use kitchenguard::sensors::climate::{HUMIDITY_RANGE_PCT, decode_frame};

fuzz_target!(|frame: [u8; 5]| {
    let Ok(reading) = decode_frame(frame) else {
        return;
    };
    if let Some(t) = reading.temperature_c {
        assert!(t.is_finite());
    }
    if let Some(h) = reading.humidity_pct {
        assert!(h.is_finite());
        assert!((HUMIDITY_RANGE_PCT.0..=HUMIDITY_RANGE_PCT.1).contains(&h));
    }
});
