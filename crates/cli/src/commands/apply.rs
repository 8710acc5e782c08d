//! `apply`: write an edited table into a copy of an image

use std::path::Path;

use anyhow::Result;
use ecu_map_codec::registry::normalize_map_name;
use ecu_map_codec::{EditedMap, MapCodec, WriteOptions};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::commands::{ApplyArgs, read_file};
use crate::error::CliError;
use crate::output;

/// Accepted table files: a bare `[[number|null]]` array, or a full `extract`
/// document whose `map` field holds the table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableFile {
    Bare(EditedMap),
    Decoded { map: EditedMap },
}

impl TableFile {
    fn into_table(self) -> EditedMap {
        match self {
            TableFile::Bare(table) | TableFile::Decoded { map: table } => table,
        }
    }
}

/// Parse an edited table from JSON text.
pub fn parse_table(text: &str) -> Result<EditedMap, CliError> {
    serde_json::from_str::<TableFile>(text)
        .map(TableFile::into_table)
        .map_err(|e| CliError::InvalidTable(e.to_string()))
}

fn read_table(path: &Path) -> Result<EditedMap, CliError> {
    let bytes = read_file(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| CliError::InvalidTable(format!("{}: {e}", path.display())))?;
    parse_table(&text)
}

pub fn execute(codec: &MapCodec, args: &ApplyArgs, pretty: bool) -> Result<()> {
    codec.registry().lookup(&args.map)?;

    let edited = read_table(&args.table)?;
    let image = read_file(&args.image)?;

    let options = if args.preserve_missing {
        WriteOptions::preserve_missing()
    } else {
        WriteOptions::default()
    };
    let outcome = codec.apply_with_options(&args.map, &image, &edited, options)?;

    std::fs::write(&args.output, &outcome.image).map_err(|source| CliError::Write {
        path: args.output.display().to_string(),
        source,
    })?;
    info!(
        map = %args.map,
        output = %args.output.display(),
        bytes = outcome.image.len(),
        "image written"
    );

    output::print_json(
        &json!({
            "success": true,
            "map": normalize_map_name(&args.map),
            "output": args.output.display().to_string(),
            "bytes": outcome.image.len(),
            "diagnostics": outcome.diagnostics,
        }),
        pretty,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parses_bare_table_with_nulls() -> TestResult {
        let table = parse_table("[[1.5, null], [0, 2]]")?;
        assert_eq!(table, vec![vec![Some(1.5), None], vec![Some(0.0), Some(2.0)]]);
        Ok(())
    }

    #[test]
    fn parses_extract_document() -> TestResult {
        let text = r#"{"name":"fuel","block_offset":"0x0","map":[[5.0]],"x_axis":[0.0]}"#;
        assert_eq!(parse_table(text)?, vec![vec![Some(5.0)]]);
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_cells() {
        assert!(matches!(
            parse_table(r#"[["fast"]]"#),
            Err(CliError::InvalidTable(_))
        ));
        assert!(matches!(parse_table("{}"), Err(CliError::InvalidTable(_))));
    }
}
