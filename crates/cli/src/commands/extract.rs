//! `extract`: decode one map from an image and print it as JSON

use anyhow::Result;
use ecu_map_codec::MapCodec;
use tracing::info;

use crate::commands::{ExtractArgs, read_file};
use crate::output;

pub fn execute(codec: &MapCodec, args: &ExtractArgs, pretty: bool) -> Result<()> {
    // Unknown names fail before the image is read.
    codec.registry().lookup(&args.map)?;

    let image = read_file(&args.image)?;
    let extraction = codec.extract(&args.map, &image)?;
    info!(
        map = %extraction.map.name,
        image = %args.image.display(),
        warnings = extraction.diagnostics.len(),
        "map extracted"
    );

    output::print_json(&extraction.map, pretty)?;
    Ok(())
}
