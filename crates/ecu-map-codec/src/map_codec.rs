//! Name-based entry points over a [`MapRegistry`].

use crate::error::MapError;
use crate::extract::{self, Extraction};
use crate::registry::MapRegistry;
use crate::write::{self, WriteOptions, WriteOutcome};

/// Registry-backed codec: look a map up by name, then decode or encode it.
///
/// Holds no per-call state; share it by reference across threads.
///
/// # Example
///
/// ```
/// use ecu_map_codec::{MapCodec, MapRegistry};
///
/// let codec = MapCodec::new(MapRegistry::builtin()?);
/// let image = vec![100u8; 0x1D8710 + 256];
///
/// let extraction = codec.extract("fuel", &image)?;
/// assert_eq!(extraction.map.get(0, 0), Some(5.0));
/// assert!(extraction.is_uniform());
///
/// let outcome = codec.apply("fuel", &image, &extraction.map.to_edited())?;
/// assert_eq!(outcome.image, image);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct MapCodec {
    registry: MapRegistry,
}

impl MapCodec {
    /// Wrap a validated registry.
    pub fn new(registry: MapRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    /// Decode map `name` from `image`.
    ///
    /// # Errors
    ///
    /// [`MapError::UnknownMap`] or [`MapError::FileTooSmall`].
    pub fn extract(&self, name: &str, image: &[u8]) -> Result<Extraction, MapError> {
        let definition = self.registry.lookup(name)?;
        extract::extract(image, definition)
    }

    /// Encode `edited` into a copy of `image` for map `name`.
    ///
    /// # Errors
    ///
    /// [`MapError::UnknownMap`], [`MapError::ShapeMismatch`] or
    /// [`MapError::FileTooSmall`].
    pub fn apply(
        &self,
        name: &str,
        image: &[u8],
        edited: &[Vec<Option<f64>>],
    ) -> Result<WriteOutcome, MapError> {
        self.apply_with_options(name, image, edited, WriteOptions::default())
    }

    /// Like [`MapCodec::apply`] with explicit [`WriteOptions`].
    ///
    /// # Errors
    ///
    /// As [`MapCodec::apply`].
    pub fn apply_with_options(
        &self,
        name: &str,
        image: &[u8],
        edited: &[Vec<Option<f64>>],
        options: WriteOptions,
    ) -> Result<WriteOutcome, MapError> {
        let definition = self.registry.lookup(name)?;
        write::apply_with_options(image, definition, edited, options)
    }
}

impl From<MapRegistry> for MapCodec {
    fn from(registry: MapRegistry) -> Self {
        Self::new(registry)
    }
}
