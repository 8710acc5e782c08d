//! Convenience re-exports for callers of the map codec.
//!
//! ```
//! use ecu_map_codec::prelude::*;
//!
//! let registry = MapRegistry::builtin()?;
//! let fuel = registry.lookup("fuel")?;
//! assert_eq!(fuel.data_width(), DataWidth::U8);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use crate::codec::{ByteOrder, DataWidth};
pub use crate::diagnostics::{Diagnostic, DiagnosticSeverity};
pub use crate::error::{CodecError, MapError, MapErrorKind, RegistryError};
pub use crate::extract::{DecodedMap, Extraction};
pub use crate::layout::{AxisDefinition, MapDefinition};
pub use crate::map_codec::MapCodec;
pub use crate::registry::{DEFAULT_MAP, MapRegistry};
pub use crate::write::{EditedMap, MissingCellPolicy, WriteOptions, WriteOutcome};
