//! Fuzz target: `parse_reading`
//!
//! Arbitrary broker payloads must never panic the parser, and an
//! accepted reading must carry the ingestion timestamp it was given.
//!
//! cargo fuzz run fuzz_telemetry_ingest

#![no_main]

use chrono::DateTime;
use libfuzzer_sys::fuzz_target;
use soilgate::telemetry::ingest::{MAX_PAYLOAD_LEN, parse_reading};

fuzz_target!(|data: &[u8]| {
    if let Ok(reading) = parse_reading(data, DateTime::UNIX_EPOCH) {
        assert!(data.len() <= MAX_PAYLOAD_LEN);
        assert_eq!(reading.captured_at, DateTime::UNIX_EPOCH);
    }
});
