//! Command implementations for the ecumap CLI

pub mod apply;
pub mod extract;
pub mod list;

use std::path::{Path, PathBuf};

use clap::Args;
use ecu_map_codec::{DEFAULT_MAP, MapRegistry, RegistryError};
use tracing::debug;

use crate::error::CliError;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Firmware image to read
    pub image: PathBuf,

    /// Map to decode (case-insensitive)
    #[arg(short, long, default_value = DEFAULT_MAP)]
    pub map: String,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Firmware image to start from; it is never modified
    pub image: PathBuf,

    /// Map to encode (case-insensitive)
    #[arg(short, long, default_value = DEFAULT_MAP)]
    pub map: String,

    /// Edited table: a JSON array of rows, or the output of `extract`
    #[arg(short, long)]
    pub table: PathBuf,

    /// Where to write the new image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Keep the original bytes of `null` cells instead of writing zero
    #[arg(long)]
    pub preserve_missing: bool,
}

/// Load the registry from `path`, or the built-in layouts when absent.
pub fn load_registry(path: Option<&Path>) -> Result<MapRegistry, RegistryError> {
    match path {
        Some(path) => MapRegistry::from_path(path),
        None => {
            debug!("using built-in map layouts");
            MapRegistry::builtin()
        }
    }
}

/// Read a whole file, tagging failures with the path.
pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}
