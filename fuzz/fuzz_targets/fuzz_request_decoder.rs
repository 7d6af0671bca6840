//! Fuzz target: `RequestDecoder::feed`
//!
//! Feeds arbitrary bytes in two chunks and checks the decoder never
//! panics and never yields a body longer than the request bound.
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use soilgate::api::http::{MAX_REQUEST_SIZE, RequestDecoder};

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |b| *b as usize).min(data.len());
    let (head, tail) = data.split_at(split);

    let mut decoder = RequestDecoder::new();
    for chunk in [head, tail] {
        match decoder.feed(chunk) {
            Ok(Some(req)) => {
                assert!(req.body.len() <= MAX_REQUEST_SIZE);
                assert!(req.path.starts_with('/'));
                break;
            }
            Ok(None) => {}
            Err(_) => break,
        }
    }

    // Whole input in one read; covers huge Content-Length values.
    let _ = RequestDecoder::new().feed(data);
});
