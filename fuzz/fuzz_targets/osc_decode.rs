#![no_main]

use libfuzzer_sys::fuzz_target;
use paper_core::OscFraming;
use paper_fuzz::check_decode;

fuzz_target!(|data: &[u8]| {
    check_decode(data, OscFraming::Unpadded);
    check_decode(data, OscFraming::Aligned);
});
