#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loader must not panic on any input.
    let _ = covmetrics::loader::parse_coverage_map(data);
});
