//! Calibration map codec for ECU firmware images.
//!
//! Decodes fixed-layout numeric tables stored at known offsets in a firmware
//! image into physical values, and writes edited tables back into a copy of
//! the image.
//!
//! # Overview
//!
//! - [`codec`]: one- and two-byte unsigned scalars in either byte order
//! - [`scaling`]: `value = raw * factor + bias` and its clamped inverse
//! - [`layout`] / [`registry`]: validated, immutable map definitions loaded
//!   from YAML
//! - [`extract`]: image → [`DecodedMap`]
//! - [`write`]: edited table → new image
//! - [`diagnostics`]: uniform-block and out-of-bounds findings
//!
//! The crate does no I/O on the request path and keeps no state between
//! calls. Checksum recalculation is not performed; an image produced by
//! [`write::apply`] still has to be finalized by the caller before it is
//! valid for an ECU.
//!
//! # Example
//!
//! ```
//! use ecu_map_codec::{MapDefinition, extract, write};
//!
//! let fuel = MapDefinition::builder("fuel", 0, 16, 16)
//!     .scaling(0.05, 0.0)
//!     .build()?;
//! let image = vec![100u8; 256];
//!
//! let extraction = extract::extract(&image, &fuel)?;
//! assert_eq!(extraction.map.get(3, 7), Some(5.0));
//!
//! let mut edited = extraction.map.to_edited();
//! edited[0][0] = Some(6.0);
//! let outcome = write::apply(&image, &fuel, &edited)?;
//! assert_eq!(outcome.image[0], 120);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod layout;
pub mod map_codec;
pub mod prelude;
pub mod registry;
pub mod scaling;
pub mod write;

pub use codec::{ByteOrder, DataWidth};
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use error::{CodecError, MapError, MapErrorKind, RegistryError};
pub use extract::{DecodedMap, Extraction};
pub use layout::{AxisDefinition, MapDefinition, MapDefinitionBuilder};
pub use map_codec::MapCodec;
pub use registry::{DEFAULT_MAP, MapRegistry};
pub use write::{EditedMap, MissingCellPolicy, WriteOptions, WriteOutcome};
