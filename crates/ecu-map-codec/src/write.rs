//! Encode path: an edited table of physical values back into image bytes.
//!
//! The writer works on a full copy of the input image and only touches the
//! map's block. Axes and checksums are left alone; finalizing the image
//! (checksum recalculation in particular) is the caller's job.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::diagnostics::{Diagnostic, record};
use crate::error::MapError;
use crate::layout::MapDefinition;
use crate::scaling::{needs_clamp, to_raw};

/// An edited table: `rows x cols` optional physical values.
pub type EditedMap = Vec<Vec<Option<f64>>>;

/// What to write for a `None` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCellPolicy {
    /// Write raw 0.
    #[default]
    WriteZero,
    /// Keep the original bytes of the cell.
    PreserveOriginal,
}

/// Writer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Handling of `None` cells.
    pub missing_cells: MissingCellPolicy,
}

impl WriteOptions {
    /// Options that keep the original bytes of `None` cells.
    pub fn preserve_missing() -> Self {
        Self {
            missing_cells: MissingCellPolicy::PreserveOriginal,
        }
    }
}

/// A re-encoded image plus the diagnostics raised while writing it.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// The new image, the same length as the input.
    pub image: Vec<u8>,
    /// Non-fatal findings, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
}

/// Check that `edited` is exactly `rows x cols`.
///
/// # Errors
///
/// Returns [`MapError::ShapeMismatch`] on any row-count or row-length mismatch.
pub fn check_shape(
    definition: &MapDefinition,
    edited: &[Vec<Option<f64>>],
) -> Result<(), MapError> {
    let (rows, cols) = (definition.rows(), definition.cols());
    let bad_row = edited.iter().find(|row| row.len() != cols);
    if edited.len() != rows || bad_row.is_some() {
        return Err(MapError::ShapeMismatch {
            map: definition.name().to_string(),
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: edited.len(),
            actual_cols: bad_row.map_or(cols, Vec::len),
        });
    }
    Ok(())
}

/// Write `edited` into a copy of `buffer` with default [`WriteOptions`].
///
/// # Errors
///
/// See [`apply_with_options`].
pub fn apply(
    buffer: &[u8],
    definition: &MapDefinition,
    edited: &[Vec<Option<f64>>],
) -> Result<WriteOutcome, MapError> {
    apply_with_options(buffer, definition, edited, WriteOptions::default())
}

/// Write `edited` into a copy of `buffer`.
///
/// Both checks run before anything is copied, so a failed call never
/// produces an image. Cells whose window falls outside the image are skipped
/// with a [`Diagnostic::CellSkipped`] instead of failing the whole write.
///
/// # Errors
///
/// - [`MapError::ShapeMismatch`] when `edited` is not `rows x cols`.
/// - [`MapError::FileTooSmall`] when `buffer` is shorter than the block end.
pub fn apply_with_options(
    buffer: &[u8],
    definition: &MapDefinition,
    edited: &[Vec<Option<f64>>],
    options: WriteOptions,
) -> Result<WriteOutcome, MapError> {
    check_shape(definition, edited)?;
    if buffer.len() < definition.block_end() {
        return Err(MapError::FileTooSmall {
            map: definition.name().to_string(),
            required: definition.block_end(),
            actual: buffer.len(),
        });
    }

    let name = definition.name();
    let width = definition.data_width();
    let mut image = buffer.to_vec();
    let mut diagnostics = Vec::new();
    let mut written = 0usize;

    for (row, values) in edited.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let raw = match (value, options.missing_cells) {
                (None, MissingCellPolicy::PreserveOriginal) => continue,
                (None, MissingCellPolicy::WriteZero) => 0,
                (Some(value), _) => {
                    let raw = to_raw(*value, definition.factor(), definition.bias(), width);
                    if needs_clamp(*value, definition.factor(), definition.bias(), width) {
                        record(
                            &mut diagnostics,
                            Diagnostic::ValueClamped {
                                map: name.to_string(),
                                row,
                                col,
                                written: raw,
                            },
                        );
                    }
                    raw
                }
            };

            let Some(offset) = definition.cell_offset(row, col) else {
                continue;
            };
            match codec::encode_into(&mut image, offset, raw, width) {
                Ok(()) => written += 1,
                Err(_) => record(
                    &mut diagnostics,
                    Diagnostic::CellSkipped {
                        map: name.to_string(),
                        row,
                        col,
                        offset,
                    },
                ),
            }
        }
    }

    debug!(
        map = name,
        offset = definition.block_offset(),
        cells_written = written,
        diagnostics = diagnostics.len(),
        "map applied"
    );

    Ok(WriteOutcome { image, diagnostics })
}
