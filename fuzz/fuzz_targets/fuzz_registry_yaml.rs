//! Fuzzes layout document parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_registry_yaml
#![no_main]
use ecu_map_codec::MapRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Must never panic on arbitrary documents; errors are expected.
    let _ = MapRegistry::from_yaml_str(text);
});
