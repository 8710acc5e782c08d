//! Decode path: image bytes to a table of physical values.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::codec::{self, DataWidth};
use crate::diagnostics::{Diagnostic, record, uniform_byte};
use crate::error::MapError;
use crate::layout::{AxisDefinition, MapDefinition};
use crate::scaling::{round_for_output, synthesize_axis_value, to_physical};

/// A decoded map, shaped `rows x cols`, ready for the boundary layer.
///
/// Serializes as
/// `{ name, display_name, unit, block_offset, x_axis, y_axis, map }` with
/// `block_offset` as a lower-case hex string and unreadable cells as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMap {
    /// Registry name.
    pub name: String,
    /// Presentation name.
    pub display_name: String,
    /// Unit label.
    pub unit: String,
    /// Offset of the first cell.
    #[serde(serialize_with = "serialize_hex_offset")]
    pub block_offset: usize,
    /// Column labels, `cols` long.
    pub x_axis: Vec<Option<f64>>,
    /// Row labels, `rows` long.
    pub y_axis: Vec<Option<f64>>,
    /// Row-major physical values.
    #[serde(rename = "map")]
    pub cells: Vec<Vec<Option<f64>>>,
}

impl DecodedMap {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Number of columns (length of the first row).
    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Value at `(row, col)`; `None` for unreadable or out-of-range cells.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// The cells as an editable table, for feeding back into the writer.
    pub fn to_edited(&self) -> Vec<Vec<Option<f64>>> {
        self.cells.clone()
    }
}

fn serialize_hex_offset<S: Serializer>(offset: &usize, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{offset:#x}"))
}

/// A decoded map plus the diagnostics raised while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The decoded table.
    pub map: DecodedMap,
    /// Non-fatal findings, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Whether a [`Diagnostic::SuspiciousUniformBlock`] was raised.
    pub fn is_uniform(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::SuspiciousUniformBlock { .. }))
    }
}

/// Check that `buffer` holds every byte `definition` reads.
///
/// # Errors
///
/// Returns [`MapError::FileTooSmall`] when the buffer is short.
pub fn check_len(buffer: &[u8], definition: &MapDefinition) -> Result<(), MapError> {
    let required = definition.required_len();
    if buffer.len() < required {
        return Err(MapError::FileTooSmall {
            map: definition.name().to_string(),
            required,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Decode `definition`'s table and axes from `buffer`.
///
/// The length check runs first; a short buffer never yields a partial map.
///
/// # Errors
///
/// Returns [`MapError::FileTooSmall`] when `buffer` is shorter than
/// [`MapDefinition::required_len`].
pub fn extract(buffer: &[u8], definition: &MapDefinition) -> Result<Extraction, MapError> {
    check_len(buffer, definition)?;

    let name = definition.name();
    let width = definition.data_width();
    let mut diagnostics = Vec::new();
    let mut negatives = 0usize;

    let mut cells = Vec::with_capacity(definition.rows());
    for row in 0..definition.rows() {
        let mut values = Vec::with_capacity(definition.cols());
        for col in 0..definition.cols() {
            let raw = definition
                .cell_offset(row, col)
                .and_then(|offset| codec::decode(buffer, offset, width).ok());
            let Some(raw) = raw else {
                record(
                    &mut diagnostics,
                    Diagnostic::CellOutOfBounds {
                        map: name.to_string(),
                        row,
                        col,
                    },
                );
                values.push(None);
                continue;
            };

            let mut value = to_physical(raw, definition.factor(), definition.bias());
            if definition.clamp_non_negative() && value < 0.0 {
                value = 0.0;
                negatives += 1;
            }
            values.push(Some(round_for_output(value)));
        }
        cells.push(values);
    }

    let x_axis = decode_axis(
        buffer,
        name,
        'x',
        definition.x_axis(),
        definition.cols(),
        &mut diagnostics,
    );
    let y_axis = decode_axis(
        buffer,
        name,
        'y',
        definition.y_axis(),
        definition.rows(),
        &mut diagnostics,
    );

    let block = buffer.get(definition.block_offset()..definition.block_end());
    if let Some(byte) = block.and_then(uniform_byte) {
        record(
            &mut diagnostics,
            Diagnostic::SuspiciousUniformBlock {
                map: name.to_string(),
                byte,
            },
        );
    }

    if negatives > 0 {
        record(
            &mut diagnostics,
            Diagnostic::NegativeValuesClamped {
                map: name.to_string(),
                count: negatives,
            },
        );
    }

    debug!(
        map = name,
        offset = definition.block_offset(),
        rows = definition.rows(),
        cols = definition.cols(),
        image_len = buffer.len(),
        diagnostics = diagnostics.len(),
        "map extracted"
    );

    Ok(Extraction {
        map: DecodedMap {
            name: name.to_string(),
            display_name: definition.display_name().to_string(),
            unit: definition.unit().to_string(),
            block_offset: definition.block_offset(),
            x_axis,
            y_axis,
            cells,
        },
        diagnostics,
    })
}

fn decode_axis(
    buffer: &[u8],
    map: &str,
    label: char,
    axis: &AxisDefinition,
    len: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Option<f64>> {
    let Some(start) = axis.offset else {
        return (0..len)
            .map(|index| Some(synthesize_axis_value(index, axis.scale)))
            .collect();
    };

    (0..len)
        .map(|index| {
            let raw = element_offset(start, index, axis.width)
                .and_then(|offset| codec::decode(buffer, offset, axis.width).ok());
            match raw {
                Some(raw) => Some(round_for_output(to_physical(raw, axis.scale, 0.0))),
                None => {
                    record(
                        diagnostics,
                        Diagnostic::AxisOutOfBounds {
                            map: map.to_string(),
                            axis: label,
                            index,
                        },
                    );
                    None
                }
            }
        })
        .collect()
}

fn element_offset(start: usize, index: usize, width: DataWidth) -> Option<usize> {
    index
        .checked_mul(width.bytes())
        .and_then(|bytes| start.checked_add(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteOrder;
    use approx::assert_abs_diff_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn fuel_at(offset: usize) -> Result<MapDefinition, crate::error::RegistryError> {
        MapDefinition::builder("fuel", offset, 16, 16)
            .unit("ms")
            .scaling(0.05, 0.0)
            .build()
    }

    #[test]
    fn test_uniform_block_decodes_and_warns() -> TestResult {
        let def = fuel_at(0)?;
        let buffer = vec![100u8; 256];
        let extraction = extract(&buffer, &def)?;

        assert_eq!(extraction.map.rows(), 16);
        assert_eq!(extraction.map.cols(), 16);
        for row in &extraction.map.cells {
            for cell in row {
                assert_abs_diff_eq!(cell.unwrap_or(f64::NAN), 5.0, epsilon = 1e-9);
            }
        }
        assert!(extraction.is_uniform());
        Ok(())
    }

    #[test]
    fn test_short_buffer_is_rejected_without_partial_result() -> TestResult {
        let def = fuel_at(0x10)?;
        let buffer = vec![1u8; 0x10 + 255];
        let result = extract(&buffer, &def);
        assert_eq!(
            result,
            Err(MapError::FileTooSmall {
                map: "fuel".to_string(),
                required: 0x110,
                actual: 0x10F,
            })
        );
        Ok(())
    }

    #[test]
    fn test_row_major_layout() -> TestResult {
        let def = MapDefinition::builder("grid", 2, 2, 3).build()?;
        let buffer = [0xEE, 0xEE, 1, 2, 3, 4, 5, 6];
        let extraction = extract(&buffer, &def)?;
        let expected = vec![
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![Some(4.0), Some(5.0), Some(6.0)],
        ];
        assert_eq!(extraction.map.cells, expected);
        assert!(!extraction.is_uniform());
        assert!(extraction.diagnostics.is_empty());
        Ok(())
    }

    #[test]
    fn test_sixteen_bit_cells_and_stored_axes() -> TestResult {
        let wide = DataWidth::U16(ByteOrder::Big);
        let def = MapDefinition::builder("boost", 0, 1, 2)
            .data_width(wide)
            .scaling(0.01, -1.0)
            .x_axis(AxisDefinition::stored(4, 10.0, wide))
            .y_axis(AxisDefinition::stored(8, 1.0, DataWidth::U8))
            .build()?;
        // cells: 0x0100 = 256, 0x0064 = 100; x axis: 0x0001, 0x0002; y axis: 0x2A
        let buffer = [0x01, 0x00, 0x00, 0x64, 0x00, 0x01, 0x00, 0x02, 0x2A];
        let extraction = extract(&buffer, &def)?;
        assert_eq!(extraction.map.cells, vec![vec![Some(1.56), Some(0.0)]]);
        assert_eq!(extraction.map.x_axis, vec![Some(10.0), Some(20.0)]);
        assert_eq!(extraction.map.y_axis, vec![Some(42.0)]);
        Ok(())
    }

    #[test]
    fn test_synthesized_axes() -> TestResult {
        let def = MapDefinition::builder("ign", 0, 3, 4)
            .x_axis(AxisDefinition::synthesized(500.0, DataWidth::U8))
            .y_axis(AxisDefinition::synthesized(12.5, DataWidth::U8))
            .build()?;
        let extraction = extract(&[0u8; 12], &def)?;
        assert_eq!(
            extraction.map.x_axis,
            vec![Some(0.0), Some(500.0), Some(1000.0), Some(1500.0)]
        );
        // round(k * 12.5) rounds half away from zero
        assert_eq!(extraction.map.y_axis, vec![Some(0.0), Some(13.0), Some(25.0)]);
        Ok(())
    }

    #[test]
    fn test_negative_clamp_is_per_definition() -> TestResult {
        let clamped = MapDefinition::builder("boost", 0, 1, 2)
            .scaling(1.0, -10.0)
            .clamp_non_negative(true)
            .build()?;
        let unclamped = MapDefinition::builder("baro", 0, 1, 2)
            .scaling(1.0, -10.0)
            .build()?;
        let buffer = [5u8, 20];

        let extraction = extract(&buffer, &clamped)?;
        assert_eq!(extraction.map.cells, vec![vec![Some(0.0), Some(10.0)]]);
        assert!(extraction.diagnostics.contains(&Diagnostic::NegativeValuesClamped {
            map: "boost".to_string(),
            count: 1,
        }));

        let extraction = extract(&buffer, &unclamped)?;
        assert_eq!(extraction.map.cells, vec![vec![Some(-5.0), Some(10.0)]]);
        Ok(())
    }

    #[test]
    fn test_serialized_shape() -> TestResult {
        let def = MapDefinition::builder("fuel", 0x1D, 1, 2)
            .unit("ms")
            .scaling(0.05, 0.0)
            .build()?;
        let mut buffer = vec![0u8; 0x1F];
        buffer[0x1E] = 7;
        let extraction = extract(&buffer, &def)?;
        let json = serde_json::to_value(&extraction.map)?;
        assert_eq!(json["name"], "fuel");
        assert_eq!(json["display_name"], "Fuel");
        assert_eq!(json["unit"], "ms");
        assert_eq!(json["block_offset"], "0x1d");
        assert_eq!(json["map"][0][0], 0.0);
        assert_eq!(json["map"][0][1], 0.35);
        assert_eq!(json["x_axis"][1], 1.0);
        Ok(())
    }

    #[test]
    fn test_decoded_map_accessors() -> TestResult {
        let def = MapDefinition::builder("grid", 0, 2, 2).build()?;
        let extraction = extract(&[1, 2, 3, 4], &def)?;
        assert_eq!(extraction.map.get(1, 0), Some(3.0));
        assert_eq!(extraction.map.get(2, 0), None);
        assert_eq!(extraction.map.to_edited(), extraction.map.cells);
        Ok(())
    }
}
