//! Fuzzes the writer with arbitrary images and edited values.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_apply
#![no_main]
use ecu_map_codec::{ByteOrder, DataWidth, MapDefinition, WriteOptions, write};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [flags, rest @ ..] = data else {
        return;
    };
    let width = if flags & 1 == 0 {
        DataWidth::U8
    } else {
        DataWidth::U16(ByteOrder::Little)
    };
    let Ok(definition) = MapDefinition::builder("fuzz", 0, 2, 2)
        .data_width(width)
        .scaling(0.01, 0.0)
        .build()
    else {
        return;
    };

    // Four edited cells from the first 32 bytes; `None` when the value is NaN.
    let values: Vec<Option<f64>> = rest
        .chunks_exact(8)
        .take(4)
        .filter_map(|chunk| <[u8; 8]>::try_from(chunk).ok())
        .map(|bytes| Some(f64::from_le_bytes(bytes)).filter(|v| !v.is_nan()))
        .collect();
    if values.len() < 4 {
        return;
    }
    let edited = vec![values[..2].to_vec(), values[2..].to_vec()];
    let image = rest.get(32..).unwrap_or_default();

    let options = if flags & 2 == 0 {
        WriteOptions::default()
    } else {
        WriteOptions::preserve_missing()
    };
    // Must never panic; the output always keeps the input length.
    if let Ok(outcome) = write::apply_with_options(image, &definition, &edited, options) {
        assert_eq!(outcome.image.len(), image.len());
    }
});
