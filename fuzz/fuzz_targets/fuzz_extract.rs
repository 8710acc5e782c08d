//! Fuzzes map extraction with an input-derived layout over arbitrary bytes.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_extract
#![no_main]
use ecu_map_codec::{AxisDefinition, ByteOrder, DataWidth, MapDefinition, MapError, extract};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [flags, offset, rows, cols, axis, image @ ..] = data else {
        return;
    };
    let width = match flags % 3 {
        0 => DataWidth::U8,
        1 => DataWidth::U16(ByteOrder::Big),
        _ => DataWidth::U16(ByteOrder::Little),
    };
    let mut builder = MapDefinition::builder(
        "fuzz",
        usize::from(*offset),
        usize::from(rows % 32) + 1,
        usize::from(cols % 32) + 1,
    )
    .data_width(width)
    .scaling(0.05, -1.5)
    .clamp_non_negative(flags & 0x80 != 0);
    if flags & 0x40 != 0 {
        builder = builder.x_axis(AxisDefinition::stored(usize::from(*axis), 1.0, width));
    }
    let Ok(definition) = builder.build() else {
        return;
    };

    // Must never panic; a short image is the only expected failure.
    match extract::extract(image, &definition) {
        Ok(extraction) => {
            assert_eq!(extraction.map.rows(), definition.rows());
            assert_eq!(extraction.map.cols(), definition.cols());
        }
        Err(MapError::FileTooSmall { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
});
