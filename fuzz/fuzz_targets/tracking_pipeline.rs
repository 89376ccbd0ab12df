#![no_main]

use libfuzzer_sys::fuzz_target;
use paper_fuzz::{check_decode, check_round_trip, run_pipeline, FuzzDatagram};

fuzz_target!(|datagrams: Vec<FuzzDatagram>| {
    for datagram in &datagrams {
        check_round_trip(datagram);
        if let Some(bytes) = datagram.to_bytes() {
            check_decode(&bytes, datagram.framing());
        }
    }
    run_pipeline(&datagrams);
});
