//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use ecu_map_codec::{MapDefinition, MapError, MapRegistry, RegistryError};
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

/// Serialize `value` to stdout, compact or indented.
pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Stable machine-readable name for an error.
pub fn error_type_name(error: &Error) -> String {
    if let Some(map_error) = error.downcast_ref::<MapError>() {
        return map_error.kind().to_string();
    }
    if error.downcast_ref::<RegistryError>().is_some() {
        return "invalid_registry".to_string();
    }
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidTable(_)) | Some(CliError::JsonError(_)) => {
            "invalid_table".to_string()
        }
        Some(CliError::Read { .. }) | Some(CliError::Write { .. }) => "io".to_string(),
        None => "error".to_string(),
    }
}

/// One row of the `list` output.
#[derive(Debug, Serialize)]
pub struct MapSummary<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub unit: &'a str,
    pub block_offset: String,
    pub rows: usize,
    pub cols: usize,
    pub data_width: usize,
    pub factor: f64,
    pub bias: f64,
}

impl<'a> From<&'a MapDefinition> for MapSummary<'a> {
    fn from(def: &'a MapDefinition) -> Self {
        Self {
            name: def.name(),
            display_name: def.display_name(),
            unit: def.unit(),
            block_offset: format!("{:#x}", def.block_offset()),
            rows: def.rows(),
            cols: def.cols(),
            data_width: def.data_width().bytes(),
            factor: def.factor(),
            bias: def.bias(),
        }
    }
}

/// Print the registered maps in the requested format.
pub fn print_map_list(registry: &MapRegistry, json: bool, pretty: bool) -> Result<(), CliError> {
    let maps: Vec<MapSummary<'_>> = registry.definitions().map(MapSummary::from).collect();

    if json {
        return print_json(&json!({ "success": true, "maps": maps }), pretty);
    }

    if maps.is_empty() {
        println!("{}", "No maps registered".yellow());
        return Ok(());
    }

    println!("{}", "Registered Maps:".bold());
    for map in &maps {
        println!(
            "  {} {} ({})",
            "●".green(),
            map.name.bold(),
            map.display_name.dimmed()
        );
        println!(
            "    Offset: {}  Size: {}x{}  Width: {} byte(s)  Unit: {}",
            map.block_offset, map.rows, map.cols, map.data_width, map.unit
        );
    }
    Ok(())
}
