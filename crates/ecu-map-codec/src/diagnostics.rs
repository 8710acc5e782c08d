//! Non-fatal findings produced while decoding or encoding a map.
//!
//! Diagnostics never change whether a call succeeds. They are returned next
//! to the result for the boundary layer to surface, and each one is also
//! logged through `tracing` at the matching level.

use core::fmt;

use serde::Serialize;
use tracing::{debug, warn};

/// How loudly a diagnostic should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Expected behavior worth recording.
    Info,
    /// Likely configuration or data problem.
    Warning,
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Every byte of the block has the same value: likely a wrong offset or an
    /// untouched default table.
    SuspiciousUniformBlock {
        /// Map name.
        map: String,
        /// The repeated byte.
        byte: u8,
    },
    /// A cell could not be decoded and was reported as `None`.
    CellOutOfBounds {
        /// Map name.
        map: String,
        /// Cell row.
        row: usize,
        /// Cell column.
        col: usize,
    },
    /// An axis element could not be decoded and was reported as `None`.
    AxisOutOfBounds {
        /// Map name.
        map: String,
        /// `'x'` or `'y'`.
        axis: char,
        /// Element index.
        index: usize,
    },
    /// Negative decoded values were replaced by zero.
    NegativeValuesClamped {
        /// Map name.
        map: String,
        /// Number of affected cells.
        count: usize,
    },
    /// An edited value fell outside the raw range and was clamped.
    ValueClamped {
        /// Map name.
        map: String,
        /// Cell row.
        row: usize,
        /// Cell column.
        col: usize,
        /// Raw value actually written.
        written: u32,
    },
    /// A cell's target window was outside the image and was not written.
    CellSkipped {
        /// Map name.
        map: String,
        /// Cell row.
        row: usize,
        /// Cell column.
        col: usize,
        /// Byte offset that could not be written.
        offset: usize,
    },
}

impl Diagnostic {
    /// Severity of this diagnostic.
    pub fn severity(&self) -> DiagnosticSeverity {
        match self {
            Diagnostic::NegativeValuesClamped { .. } | Diagnostic::ValueClamped { .. } => {
                DiagnosticSeverity::Info
            }
            Diagnostic::SuspiciousUniformBlock { .. }
            | Diagnostic::CellOutOfBounds { .. }
            | Diagnostic::AxisOutOfBounds { .. }
            | Diagnostic::CellSkipped { .. } => DiagnosticSeverity::Warning,
        }
    }

    /// Map the diagnostic refers to.
    pub fn map(&self) -> &str {
        match self {
            Diagnostic::SuspiciousUniformBlock { map, .. }
            | Diagnostic::CellOutOfBounds { map, .. }
            | Diagnostic::AxisOutOfBounds { map, .. }
            | Diagnostic::NegativeValuesClamped { map, .. }
            | Diagnostic::ValueClamped { map, .. }
            | Diagnostic::CellSkipped { map, .. } => map,
        }
    }

    /// Emit this diagnostic through `tracing`.
    pub fn log(&self) {
        match self.severity() {
            DiagnosticSeverity::Warning => warn!(map = self.map(), "{self}"),
            DiagnosticSeverity::Info => debug!(map = self.map(), "{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SuspiciousUniformBlock { map, byte } => write!(
                f,
                "every byte of map '{map}' is {byte:#04x}; the offset may be wrong or the table untuned"
            ),
            Diagnostic::CellOutOfBounds { map, row, col } => {
                write!(f, "cell ({row}, {col}) of map '{map}' is out of bounds")
            }
            Diagnostic::AxisOutOfBounds { map, axis, index } => {
                write!(f, "{axis} axis element {index} of map '{map}' is out of bounds")
            }
            Diagnostic::NegativeValuesClamped { map, count } => {
                write!(f, "{count} negative value(s) of map '{map}' clamped to 0")
            }
            Diagnostic::ValueClamped {
                map,
                row,
                col,
                written,
            } => write!(
                f,
                "value at ({row}, {col}) of map '{map}' clamped to raw {written}"
            ),
            Diagnostic::CellSkipped {
                map,
                row,
                col,
                offset,
            } => write!(
                f,
                "cell ({row}, {col}) of map '{map}' at offset {offset:#x} is outside the image; not written"
            ),
        }
    }
}

/// The repeated byte if `block` holds at least two bytes that are all equal.
pub fn uniform_byte(block: &[u8]) -> Option<u8> {
    let (first, rest) = block.split_first()?;
    if rest.is_empty() {
        return None;
    }
    rest.iter().all(|b| b == first).then_some(*first)
}

/// Append `diagnostic` to `sink` after logging it.
pub(crate) fn record(sink: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    diagnostic.log();
    sink.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_byte_detection() {
        assert_eq!(uniform_byte(&[100; 256]), Some(100));
        assert_eq!(uniform_byte(&[0, 0, 1]), None);
        assert_eq!(uniform_byte(&[7]), None);
        assert_eq!(uniform_byte(&[]), None);
    }

    #[test]
    fn test_severity_classification() {
        let uniform = Diagnostic::SuspiciousUniformBlock {
            map: "fuel".to_string(),
            byte: 0xFF,
        };
        assert_eq!(uniform.severity(), DiagnosticSeverity::Warning);
        assert_eq!(uniform.map(), "fuel");

        let clamped = Diagnostic::NegativeValuesClamped {
            map: "boost".to_string(),
            count: 3,
        };
        assert_eq!(clamped.severity(), DiagnosticSeverity::Info);
        assert!(DiagnosticSeverity::Warning > DiagnosticSeverity::Info);
    }

    #[test]
    fn test_display_mentions_byte_in_hex() {
        let uniform = Diagnostic::SuspiciousUniformBlock {
            map: "fuel".to_string(),
            byte: 0xFF,
        };
        assert!(uniform.to_string().contains("0xff"));
    }

    #[test]
    fn test_serializes_with_kind_tag() -> Result<(), serde_json::Error> {
        let skipped = Diagnostic::CellSkipped {
            map: "fuel".to_string(),
            row: 1,
            col: 2,
            offset: 0x40,
        };
        let json = serde_json::to_value(&skipped)?;
        assert_eq!(json["kind"], "cell_skipped");
        assert_eq!(json["row"], 1);
        assert_eq!(json["offset"], 64);
        Ok(())
    }
}
