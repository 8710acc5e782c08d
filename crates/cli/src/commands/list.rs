//! `list`: show the registered map layouts

use anyhow::Result;
use ecu_map_codec::MapRegistry;

use crate::output;

pub fn execute(registry: &MapRegistry, json: bool, pretty: bool) -> Result<()> {
    output::print_map_list(registry, json, pretty)?;
    Ok(())
}
