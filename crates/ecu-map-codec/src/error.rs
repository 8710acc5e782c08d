//! Error types for map decoding, encoding and registry construction.
//!
//! Errors are split by lifetime:
//!
//! - [`RegistryError`] is raised while the layout registry is built. It is a
//!   startup failure; a process that cannot build its registry should not
//!   serve requests.
//! - [`MapError`] is raised per request (unknown map, short image, bad table
//!   shape) and carries enough detail for the caller to self-diagnose.
//! - [`CodecError`] is the scalar-level failure used by [`crate::codec`].
//!   Cell-level codec failures inside the extractor degrade to `None` and a
//!   diagnostic instead of surfacing as errors.

use core::fmt;

/// Scalar codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The byte window `[offset, offset + width)` does not fit in the buffer.
    #[error("{width}-byte window at offset {offset:#x} is outside a {len}-byte buffer")]
    OutOfBounds {
        /// Window start.
        offset: usize,
        /// Window width in bytes.
        width: usize,
        /// Buffer length.
        len: usize,
    },

    /// The raw integer cannot be represented at the requested width.
    #[error("raw value {raw} exceeds the maximum {max} for this width")]
    RangeError {
        /// Rejected raw value.
        raw: u32,
        /// Largest representable raw value.
        max: u32,
    },
}

/// Registry construction failures. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The layout document is not valid YAML or does not match the schema.
    #[error("failed to parse map layout document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The layout file could not be read.
    #[error("failed to read map layout file '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The layout document declares a schema version this crate does not know.
    #[error("unsupported map layout schema version {0} (expected 1)")]
    UnsupportedSchemaVersion(u32),

    /// A map definition violates a layout invariant.
    #[error("invalid definition for map '{map}': {reason}")]
    InvalidDefinition {
        /// Name of the offending map (may be empty when the name itself is invalid).
        map: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Two definitions share a name after case folding.
    #[error("map '{0}' is defined more than once")]
    DuplicateName(String),
}

impl RegistryError {
    pub(crate) fn invalid(map: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::InvalidDefinition {
            map: map.into(),
            reason: reason.into(),
        }
    }
}

/// Per-request failures of the decode and encode paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The requested map name is not in the registry.
    #[error("unsupported map type '{name}'")]
    UnknownMap {
        /// Requested name, as supplied by the caller.
        name: String,
    },

    /// The image is shorter than the map layout requires.
    #[error("file too small for map '{map}': {required} bytes required, {actual} bytes available")]
    FileTooSmall {
        /// Map being read or written.
        map: String,
        /// Minimum image length for this layout.
        required: usize,
        /// Actual image length.
        actual: usize,
    },

    /// An edited table does not match the map's dimensions.
    #[error(
        "edited table for map '{map}' is {actual_rows}x{actual_cols}, expected {expected_rows}x{expected_cols}"
    )]
    ShapeMismatch {
        /// Map being written.
        map: String,
        /// Definition row count.
        expected_rows: usize,
        /// Definition column count.
        expected_cols: usize,
        /// Row count of the supplied table.
        actual_rows: usize,
        /// Length of the first row whose length differs from `expected_cols`,
        /// or `expected_cols` when only the row count is wrong.
        actual_cols: usize,
    },

    /// A scalar codec failure that could not be recovered locally.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl MapError {
    /// Coarse classification used by boundary layers to pick a status code.
    pub fn kind(&self) -> MapErrorKind {
        match self {
            MapError::UnknownMap { .. } => MapErrorKind::UnknownMap,
            MapError::FileTooSmall { .. } => MapErrorKind::FileTooSmall,
            MapError::ShapeMismatch { .. } => MapErrorKind::ShapeMismatch,
            MapError::Codec(_) => MapErrorKind::Codec,
        }
    }
}

/// Classification of [`MapError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapErrorKind {
    /// See [`MapError::UnknownMap`].
    UnknownMap,
    /// See [`MapError::FileTooSmall`].
    FileTooSmall,
    /// See [`MapError::ShapeMismatch`].
    ShapeMismatch,
    /// See [`MapError::Codec`].
    Codec,
}

impl fmt::Display for MapErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MapErrorKind::UnknownMap => "unknown_map",
            MapErrorKind::FileTooSmall => "file_too_small",
            MapErrorKind::ShapeMismatch => "shape_mismatch",
            MapErrorKind::Codec => "codec",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_small_display_carries_sizes() {
        let err = MapError::FileTooSmall {
            map: "fuel".to_string(),
            required: 1_935_120,
            actual: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("fuel"));
        assert!(msg.contains("1935120"));
        assert!(msg.contains("512"));
    }

    #[test]
    fn test_error_kinds() {
        let unknown = MapError::UnknownMap {
            name: "lambda".to_string(),
        };
        assert_eq!(unknown.kind(), MapErrorKind::UnknownMap);
        assert_eq!(unknown.kind().to_string(), "unknown_map");

        let codec: MapError = CodecError::RangeError { raw: 300, max: 255 }.into();
        assert_eq!(codec.kind(), MapErrorKind::Codec);
    }

    #[test]
    fn test_out_of_bounds_display_uses_hex_offset() {
        let err = CodecError::OutOfBounds {
            offset: 0x10,
            width: 2,
            len: 16,
        };
        assert_eq!(
            err.to_string(),
            "2-byte window at offset 0x10 is outside a 16-byte buffer"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        let err = RegistryError::DuplicateName("fuel".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
