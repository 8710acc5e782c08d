//! End-to-end scenarios through [`MapCodec`] with the built-in layouts.

use ecu_map_codec::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const FUEL_OFFSET: usize = 0x1D_8710;
const IGNITION_OFFSET: usize = 0x1F_2000;

fn codec() -> Result<MapCodec, RegistryError> {
    Ok(MapCodec::new(MapRegistry::builtin()?))
}

fn image_with_fill(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

#[test]
fn uniform_fuel_block_decodes_to_five_with_warning() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 256, 100);

    let extraction = codec.extract("fuel", &image)?;
    assert_eq!((extraction.map.rows(), extraction.map.cols()), (16, 16));
    assert!(
        extraction
            .map
            .cells
            .iter()
            .flatten()
            .all(|cell| *cell == Some(5.0))
    );
    assert!(extraction.is_uniform());
    assert!(extraction.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::SuspiciousUniformBlock { byte: 100, .. }
    )));
    Ok(())
}

#[test]
fn default_map_name_resolves_to_fuel() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 256, 0);
    let extraction = codec.extract(DEFAULT_MAP, &image)?;
    assert_eq!(extraction.map.name, "fuel");
    assert_eq!(extraction.map.display_name, "Fuel");
    Ok(())
}

#[test]
fn map_names_are_case_insensitive() -> TestResult {
    let codec = codec()?;
    let mut image = image_with_fill(IGNITION_OFFSET + 256, 0);
    if let Some(cell) = image.get_mut(IGNITION_OFFSET + 17) {
        *cell = 40;
    }
    let extraction = codec.extract("IgNiTiOn", &image)?;
    assert_eq!(extraction.map.get(1, 1), Some(2.0));
    assert_eq!(extraction.map.get(0, 0), Some(0.0));
    Ok(())
}

#[test]
fn unknown_map_is_rejected_before_reading() -> TestResult {
    let codec = codec()?;
    let result = codec.extract("lambda", &[]);
    assert_eq!(
        result.map(|_| ()),
        Err(MapError::UnknownMap {
            name: "lambda".to_string()
        })
    );
    Ok(())
}

#[test]
fn image_one_byte_short_is_file_too_small() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 255, 0);
    let err = codec.extract("fuel", &image).map(|_| ());
    assert_eq!(
        err,
        Err(MapError::FileTooSmall {
            map: "fuel".to_string(),
            required: FUEL_OFFSET + 256,
            actual: FUEL_OFFSET + 255,
        })
    );
    Ok(())
}

#[test]
fn edit_round_trip_changes_only_edited_cells() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 300, 100);

    let extraction = codec.extract("fuel", &image)?;
    let mut edited = extraction.map.to_edited();
    if let Some(cell) = edited.get_mut(3).and_then(|row| row.get_mut(7)) {
        *cell = Some(6.0);
    }

    let outcome = codec.apply("fuel", &image, &edited)?;
    assert_eq!(outcome.image.len(), image.len());

    let changed: Vec<usize> = image
        .iter()
        .zip(&outcome.image)
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(changed, vec![FUEL_OFFSET + 3 * 16 + 7]);
    assert_eq!(outcome.image.get(FUEL_OFFSET + 3 * 16 + 7), Some(&120));
    Ok(())
}

#[test]
fn negative_edit_on_fuel_is_clamped_to_zero() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 256, 100);
    let mut edited = vec![vec![Some(5.0); 16]; 16];
    if let Some(cell) = edited.get_mut(0).and_then(|row| row.get_mut(0)) {
        *cell = Some(-0.25);
    }
    let outcome = codec.apply("fuel", &image, &edited)?;
    assert_eq!(outcome.image.get(FUEL_OFFSET), Some(&0));
    assert!(outcome.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::ValueClamped {
            row: 0,
            col: 0,
            written: 0,
            ..
        }
    )));
    Ok(())
}

#[test]
fn shape_mismatch_leaves_input_untouched() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 256, 42);
    let edited = vec![vec![Some(1.0); 16]; 15];
    let result = codec.apply("fuel", &image, &edited);
    assert!(matches!(
        result,
        Err(MapError::ShapeMismatch {
            expected_rows: 16,
            actual_rows: 15,
            ..
        })
    ));
    assert!(image.iter().all(|b| *b == 42));
    Ok(())
}

#[test]
fn custom_sixteen_bit_layout_reads_both_byte_orders() -> TestResult {
    let yaml = r#"
schema_version: 1
maps:
  - name: be
    block_offset: 0
    rows: 1
    cols: 1
    data_width: 2
    byte_order: big
    factor: 1
  - name: le
    block_offset: 0
    rows: 1
    cols: 1
    data_width: 2
    byte_order: little
    factor: 1
"#;
    let codec = MapCodec::new(MapRegistry::from_yaml_str(yaml)?);
    let image = [0x01, 0x00];
    assert_eq!(codec.extract("be", &image)?.map.get(0, 0), Some(256.0));
    assert_eq!(codec.extract("le", &image)?.map.get(0, 0), Some(1.0));
    Ok(())
}

#[test]
fn extraction_serializes_with_hex_offset() -> TestResult {
    let codec = codec()?;
    let image = image_with_fill(FUEL_OFFSET + 256, 20);
    let extraction = codec.extract("fuel", &image)?;
    let json = serde_json::to_value(&extraction.map)?;

    assert_eq!(json["name"], "fuel");
    assert_eq!(json["display_name"], "Fuel");
    assert_eq!(json["unit"], "ms");
    assert_eq!(json["block_offset"], "0x1d8710");
    assert_eq!(json["map"][15][15], 1.0);
    assert_eq!(json["x_axis"][15], 15.0);
    Ok(())
}
