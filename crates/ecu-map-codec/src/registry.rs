//! Immutable registry of map layouts.
//!
//! The registry is built once at startup and only read afterwards. Every
//! definition is validated during construction, so a malformed layout stops
//! the process before the first request instead of failing per call.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{MapError, RegistryError};
use crate::layout::{MapDefinition, MapLayoutDocument};

/// The built-in layout document.
pub const DEFAULT_LAYOUT_YAML: &str = include_str!("layouts/default.yaml");

/// Map used when a caller does not name one.
pub const DEFAULT_MAP: &str = "fuel";

const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Normalize a map name at the boundary: trimmed, ASCII lower-case.
pub fn normalize_map_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Validated, read-only set of map definitions keyed by lower-case name.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRegistry {
    maps: BTreeMap<String, MapDefinition>,
}

impl MapRegistry {
    /// Build a registry from already-validated definitions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when two definitions share a name.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = MapDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut maps = BTreeMap::new();
        for definition in definitions {
            let name = definition.name().to_string();
            if maps.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            debug!(
                map = %name,
                offset = definition.block_offset(),
                rows = definition.rows(),
                cols = definition.cols(),
                "registered map layout"
            );
            maps.insert(name, definition);
        }
        Ok(Self { maps })
    }

    /// Build a registry from a parsed layout document.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for an unsupported schema version, an
    /// invalid definition or a duplicate name.
    pub fn from_document(document: &MapLayoutDocument) -> Result<Self, RegistryError> {
        if document.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(RegistryError::UnsupportedSchemaVersion(
                document.schema_version,
            ));
        }
        let definitions = document
            .maps
            .iter()
            .map(MapDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_definitions(definitions)
    }

    /// Parse and validate a YAML layout document.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Parse`] for malformed YAML, otherwise as
    /// [`MapRegistry::from_document`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        let document: MapLayoutDocument = serde_yaml::from_str(yaml)?;
        Self::from_document(&document)
    }

    /// Read, parse and validate a YAML layout file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the file cannot be read, otherwise
    /// as [`MapRegistry::from_yaml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), maps = registry.len(), "loaded map layouts");
        Ok(registry)
    }

    /// The built-in layouts.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded document is invalid, which the crate's
    /// tests rule out.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_yaml_str(DEFAULT_LAYOUT_YAML)
    }

    /// Look up a map by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownMap`] when no map has that name.
    pub fn lookup(&self, name: &str) -> Result<&MapDefinition, MapError> {
        self.maps
            .get(&normalize_map_name(name))
            .ok_or_else(|| MapError::UnknownMap {
                name: name.to_string(),
            })
    }

    /// Whether a map with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(&normalize_map_name(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Registered definitions, sorted by name.
    pub fn definitions(&self) -> impl Iterator<Item = &MapDefinition> {
        self.maps.values()
    }

    /// Number of registered maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
