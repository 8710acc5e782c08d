//! Map layout definitions and their on-disk configuration schema.
//!
//! A [`MapDefinition`] can only be obtained through validation, either from a
//! [`MapEntry`] read out of a layout document or through
//! [`MapDefinition::builder`]. Every definition in circulation therefore
//! satisfies the layout invariants:
//!
//! - `rows > 0` and `cols > 0`
//! - `factor` is finite and non-zero, `bias` and both axis scales are finite
//! - the block end and every stored axis end fit in `usize`

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{ByteOrder, DataWidth};
use crate::error::RegistryError;

/// Placement and scaling of one axis (X labels the columns, Y the rows).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDefinition {
    /// Byte offset of the stored axis array. `None` means the axis is
    /// synthesized as `index * scale`.
    pub offset: Option<usize>,
    /// Axis scale factor (axes have no bias).
    pub scale: f64,
    /// Storage width of one stored axis element.
    pub width: DataWidth,
}

impl AxisDefinition {
    /// A synthesized axis with the given scale.
    pub fn synthesized(scale: f64, width: DataWidth) -> Self {
        Self {
            offset: None,
            scale,
            width,
        }
    }

    /// An axis stored in the image at `offset`.
    pub fn stored(offset: usize, scale: f64, width: DataWidth) -> Self {
        Self {
            offset: Some(offset),
            scale,
            width,
        }
    }

    /// One past the last byte of a stored axis of `len` elements.
    ///
    /// `None` for synthesized axes, which occupy no bytes.
    pub fn end(&self, len: usize) -> Option<usize> {
        let offset = self.offset?;
        len.checked_mul(self.width.bytes())
            .and_then(|bytes| offset.checked_add(bytes))
    }
}

/// Immutable, validated layout of one calibration map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDefinition {
    name: String,
    display_name: String,
    unit: String,
    block_offset: usize,
    rows: usize,
    cols: usize,
    data_width: DataWidth,
    factor: f64,
    bias: f64,
    x_axis: AxisDefinition,
    y_axis: AxisDefinition,
    clamp_non_negative: bool,
    block_end: usize,
    required_len: usize,
}

impl MapDefinition {
    /// Start building a definition. Unset fields default to a 1-byte table,
    /// `factor = 1`, `bias = 0`, synthesized unit-scale axes, no clamp.
    pub fn builder(
        name: impl Into<String>,
        block_offset: usize,
        rows: usize,
        cols: usize,
    ) -> MapDefinitionBuilder {
        MapDefinitionBuilder {
            name: name.into(),
            display_name: None,
            unit: String::new(),
            block_offset,
            rows,
            cols,
            data_width: DataWidth::U8,
            factor: 1.0,
            bias: 0.0,
            x_axis: None,
            y_axis: None,
            clamp_non_negative: false,
        }
    }

    /// Registry key (lower-case).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name for presentation.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Physical unit label for presentation.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Byte offset of cell `(0, 0)`.
    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    /// Number of rows (Y axis length).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (X axis length).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Storage width of one table cell.
    pub fn data_width(&self) -> DataWidth {
        self.data_width
    }

    /// Scale factor of table values.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Offset (bias) of table values.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Column axis.
    pub fn x_axis(&self) -> &AxisDefinition {
        &self.x_axis
    }

    /// Row axis.
    pub fn y_axis(&self) -> &AxisDefinition {
        &self.y_axis
    }

    /// Whether negative decoded values are replaced by zero.
    pub fn clamp_non_negative(&self) -> bool {
        self.clamp_non_negative
    }

    /// Number of cells (`rows * cols`).
    pub fn cell_count(&self) -> usize {
        // Validated not to overflow at construction.
        self.rows.saturating_mul(self.cols)
    }

    /// Size of the block in bytes.
    pub fn block_len(&self) -> usize {
        self.block_end.saturating_sub(self.block_offset)
    }

    /// One past the last block byte.
    pub fn block_end(&self) -> usize {
        self.block_end
    }

    /// Minimum image length to read the block and every stored axis.
    pub fn required_len(&self) -> usize {
        self.required_len
    }

    /// Byte offset of cell `(row, col)` in row-major order.
    ///
    /// `None` when the cell lies outside the table.
    pub fn cell_offset(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        row.checked_mul(self.cols)
            .and_then(|base| base.checked_add(col))
            .and_then(|index| index.checked_mul(self.data_width.bytes()))
            .and_then(|bytes| self.block_offset.checked_add(bytes))
    }
}

/// Fluent constructor for [`MapDefinition`].
#[derive(Debug, Clone)]
pub struct MapDefinitionBuilder {
    name: String,
    display_name: Option<String>,
    unit: String,
    block_offset: usize,
    rows: usize,
    cols: usize,
    data_width: DataWidth,
    factor: f64,
    bias: f64,
    x_axis: Option<AxisDefinition>,
    y_axis: Option<AxisDefinition>,
    clamp_non_negative: bool,
}

impl MapDefinitionBuilder {
    /// Sets the presentation name (defaults to the capitalized map name).
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the unit label.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the cell storage width.
    pub fn data_width(mut self, width: DataWidth) -> Self {
        self.data_width = width;
        self
    }

    /// Sets `value = raw * factor + bias` for table cells.
    pub fn scaling(mut self, factor: f64, bias: f64) -> Self {
        self.factor = factor;
        self.bias = bias;
        self
    }

    /// Sets the column axis.
    pub fn x_axis(mut self, axis: AxisDefinition) -> Self {
        self.x_axis = Some(axis);
        self
    }

    /// Sets the row axis.
    pub fn y_axis(mut self, axis: AxisDefinition) -> Self {
        self.y_axis = Some(axis);
        self
    }

    /// Replace negative decoded values with zero.
    pub fn clamp_non_negative(mut self, enabled: bool) -> Self {
        self.clamp_non_negative = enabled;
        self
    }

    /// Validate and freeze the definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDefinition`] when any layout invariant
    /// is violated.
    pub fn build(self) -> Result<MapDefinition, RegistryError> {
        let name = self.name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(RegistryError::invalid(self.name, "name must not be empty"));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(RegistryError::invalid(
                name,
                format!("dimensions must be non-zero, got {}x{}", self.rows, self.cols),
            ));
        }
        if !self.factor.is_finite() || self.factor == 0.0 {
            return Err(RegistryError::invalid(
                name,
                format!("factor must be finite and non-zero, got {}", self.factor),
            ));
        }
        if !self.bias.is_finite() {
            return Err(RegistryError::invalid(
                name,
                format!("bias must be finite, got {}", self.bias),
            ));
        }

        let x_axis = self
            .x_axis
            .unwrap_or_else(|| AxisDefinition::synthesized(1.0, self.data_width));
        let y_axis = self
            .y_axis
            .unwrap_or_else(|| AxisDefinition::synthesized(1.0, self.data_width));
        for (label, axis) in [("x", &x_axis), ("y", &y_axis)] {
            if !axis.scale.is_finite() {
                return Err(RegistryError::invalid(
                    name,
                    format!("{label} axis scale must be finite, got {}", axis.scale),
                ));
            }
        }

        let block_end = self
            .rows
            .checked_mul(self.cols)
            .and_then(|cells| cells.checked_mul(self.data_width.bytes()))
            .and_then(|bytes| self.block_offset.checked_add(bytes))
            .ok_or_else(|| RegistryError::invalid(&name, "block end overflows the address space"))?;

        let mut required_len = block_end;
        for (label, axis, len) in [("x", &x_axis, self.cols), ("y", &y_axis, self.rows)] {
            if axis.offset.is_some() {
                let end = axis.end(len).ok_or_else(|| {
                    RegistryError::invalid(
                        &name,
                        format!("{label} axis end overflows the address space"),
                    )
                })?;
                required_len = required_len.max(end);
            }
        }

        let display_name = self
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| capitalize(&name));

        Ok(MapDefinition {
            name,
            display_name,
            unit: self.unit,
            block_offset: self.block_offset,
            rows: self.rows,
            cols: self.cols,
            data_width: self.data_width,
            factor: self.factor,
            bias: self.bias,
            x_axis,
            y_axis,
            clamp_non_negative: self.clamp_non_negative,
            block_end,
            required_len,
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Top-level layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapLayoutDocument {
    /// Must be `1`.
    pub schema_version: u32,
    /// Map entries, in declaration order.
    #[serde(default)]
    pub maps: Vec<MapEntry>,
}

/// A byte offset as written in a layout document: an integer, or a string in
/// hex (`"0x1D8710"`) or decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OffsetValue {
    /// Plain integer.
    Int(u64),
    /// `0x`-prefixed hex or decimal text.
    Text(String),
}

impl OffsetValue {
    fn resolve(&self, map: &str, field: &str) -> Result<usize, RegistryError> {
        let parsed = match self {
            OffsetValue::Int(value) => Some(*value),
            OffsetValue::Text(text) => {
                let text = text.trim();
                match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
                    None => text.replace('_', "").parse::<u64>().ok(),
                }
            }
        };
        parsed
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| RegistryError::invalid(map, format!("invalid {field}: {self:?}")))
    }
}

/// One map as written in a layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapEntry {
    /// Unique map name (case-insensitive).
    pub name: String,
    /// Presentation name; defaults to the capitalized `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Unit label.
    #[serde(default)]
    pub unit: String,
    /// Offset of the first cell.
    pub block_offset: OffsetValue,
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
    /// Cell width in bytes: 1 or 2.
    pub data_width: u8,
    /// Required when `data_width` is 2.
    #[serde(default)]
    pub byte_order: Option<ByteOrder>,
    /// Scale factor of table values.
    pub factor: f64,
    /// Offset of table values.
    #[serde(default)]
    pub bias: f64,
    /// Replace negative decoded values with zero.
    #[serde(default)]
    pub clamp_non_negative: bool,
    /// Column axis; synthesized with scale 1 when absent.
    #[serde(default)]
    pub x_axis: Option<AxisEntry>,
    /// Row axis; synthesized with scale 1 when absent.
    #[serde(default)]
    pub y_axis: Option<AxisEntry>,
}

/// One axis as written in a layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisEntry {
    /// Offset of the stored axis array; synthesized when absent.
    #[serde(default)]
    pub offset: Option<OffsetValue>,
    /// Axis scale factor.
    #[serde(default = "default_axis_scale")]
    pub scale: f64,
    /// Element width override; defaults to the table's width.
    #[serde(default)]
    pub data_width: Option<u8>,
    /// Element byte order; defaults to the table's order when it has one.
    #[serde(default)]
    pub byte_order: Option<ByteOrder>,
}

fn default_axis_scale() -> f64 {
    1.0
}

fn resolve_width(
    map: &str,
    field: &str,
    bytes: u8,
    order: Option<ByteOrder>,
    fallback_order: Option<ByteOrder>,
) -> Result<DataWidth, RegistryError> {
    match bytes {
        1 => {
            if order.is_some() {
                warn!(map, field, "byte_order is ignored for 1-byte data");
            }
            Ok(DataWidth::U8)
        }
        2 => order
            .or(fallback_order)
            .map(DataWidth::U16)
            .ok_or_else(|| {
                RegistryError::invalid(map, format!("{field} of 2 bytes requires a byte_order"))
            }),
        other => Err(RegistryError::invalid(
            map,
            format!("{field} must be 1 or 2 bytes, got {other}"),
        )),
    }
}

impl MapEntry {
    fn resolve_axis(
        &self,
        axis: Option<&AxisEntry>,
        label: &str,
        table_width: DataWidth,
    ) -> Result<AxisDefinition, RegistryError> {
        let Some(axis) = axis else {
            return Ok(AxisDefinition::synthesized(1.0, table_width));
        };
        let width = match axis.data_width {
            Some(bytes) => resolve_width(
                &self.name,
                &format!("{label}_axis.data_width"),
                bytes,
                axis.byte_order,
                table_width.byte_order(),
            )?,
            None => match (table_width, axis.byte_order) {
                (DataWidth::U16(_), Some(order)) => DataWidth::U16(order),
                (width, _) => width,
            },
        };
        let offset = axis
            .offset
            .as_ref()
            .map(|offset| offset.resolve(&self.name, &format!("{label}_axis.offset")))
            .transpose()?;
        Ok(AxisDefinition {
            offset,
            scale: axis.scale,
            width,
        })
    }
}

impl TryFrom<&MapEntry> for MapDefinition {
    type Error = RegistryError;

    fn try_from(entry: &MapEntry) -> Result<Self, Self::Error> {
        let data_width = resolve_width(
            &entry.name,
            "data_width",
            entry.data_width,
            entry.byte_order,
            None,
        )?;
        let block_offset = entry.block_offset.resolve(&entry.name, "block_offset")?;
        let x_axis = entry.resolve_axis(entry.x_axis.as_ref(), "x", data_width)?;
        let y_axis = entry.resolve_axis(entry.y_axis.as_ref(), "y", data_width)?;

        let mut builder = MapDefinition::builder(&entry.name, block_offset, entry.rows, entry.cols)
            .unit(entry.unit.clone())
            .data_width(data_width)
            .scaling(entry.factor, entry.bias)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .clamp_non_negative(entry.clamp_non_negative);
        if let Some(display_name) = &entry.display_name {
            builder = builder.display_name(display_name.clone());
        }
        builder.build()
    }
}
