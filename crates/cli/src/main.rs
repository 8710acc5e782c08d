//! ecumap - ECU calibration map tool
//!
//! Extracts calibration maps from firmware images as JSON and writes edited
//! maps back into a copy of the image.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ecu_map_codec::{MapCodec, MapError, MapErrorKind, RegistryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ApplyArgs, ExtractArgs};
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "ecumap")]
#[command(about = "ECU calibration map tool - extract and edit maps in firmware images")]
#[command(version)]
#[command(long_about = "
ecumap decodes fixed-layout calibration maps (fuel, ignition, boost, ...) from
ECU firmware images into physical values, and encodes edited maps back into a
copy of the image. Bytes outside the edited map are never changed.

Checksums are NOT recalculated. Finalize written images with a checksum tool
before flashing.
")]
struct Cli {
    /// Map layout file (YAML); the built-in layouts are used when absent
    #[arg(long, global = true, env = "ECUMAP_REGISTRY")]
    registry: Option<PathBuf>,

    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Indent JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered map layouts
    List,

    /// Decode a map and print it as JSON
    Extract(ExtractArgs),

    /// Write an edited map into a copy of an image
    Apply(ApplyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ecumap={log_level},ecu_map_codec={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    let registry = commands::load_registry(cli.registry.as_deref())?;
    let codec = MapCodec::new(registry);

    match &cli.command {
        Commands::List => commands::list::execute(codec.registry(), cli.json, cli.pretty),
        Commands::Extract(args) => commands::extract::execute(&codec, args, cli.pretty),
        Commands::Apply(args) => commands::apply::execute(&codec, args, cli.pretty),
    }
}

/// Process exit code for a failed command.
fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(map_error) = error.downcast_ref::<MapError>() {
        return match map_error.kind() {
            MapErrorKind::UnknownMap => 2,
            MapErrorKind::FileTooSmall => 3,
            MapErrorKind::ShapeMismatch => 4,
            MapErrorKind::Codec => 1,
        };
    }
    if error.downcast_ref::<RegistryError>().is_some() {
        return 5;
    }
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidTable(_)) | Some(CliError::JsonError(_)) => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // --- Global flag parsing ---

    #[test]
    fn parse_list_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["ecumap", "list"])?;
        assert!(!cli.json);
        assert!(!cli.pretty);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.command, Commands::List));
        Ok(())
    }

    #[test]
    fn parse_extract_defaults_to_fuel() -> TestResult {
        let cli = Cli::try_parse_from(["ecumap", "extract", "stock.bin"])?;
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.map, "fuel");
                assert_eq!(args.image, PathBuf::from("stock.bin"));
            }
            other => return Err(format!("unexpected command {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn parse_apply_with_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from([
            "ecumap",
            "apply",
            "stock.bin",
            "--map",
            "Boost",
            "--table",
            "boost.json",
            "--output",
            "tuned.bin",
            "--preserve-missing",
            "--registry",
            "maps.yaml",
            "-vv",
        ])?;
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.registry, Some(PathBuf::from("maps.yaml")));
        match cli.command {
            Commands::Apply(args) => {
                assert_eq!(args.map, "Boost");
                assert!(args.preserve_missing);
                assert_eq!(args.output, PathBuf::from("tuned.bin"));
            }
            other => return Err(format!("unexpected command {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn apply_requires_table_and_output() {
        let result = Cli::try_parse_from(["ecumap", "apply", "stock.bin"]);
        assert!(result.is_err());
    }

    // --- Exit codes ---

    #[test]
    fn exit_codes_follow_error_kind() {
        let unknown = anyhow::Error::from(MapError::UnknownMap {
            name: "lambda".to_string(),
        });
        assert_eq!(exit_code(&unknown), 2);

        let short = anyhow::Error::from(MapError::FileTooSmall {
            map: "fuel".to_string(),
            required: 10,
            actual: 9,
        });
        assert_eq!(exit_code(&short), 3);

        let shape = anyhow::Error::from(MapError::ShapeMismatch {
            map: "fuel".to_string(),
            expected_rows: 16,
            expected_cols: 16,
            actual_rows: 1,
            actual_cols: 16,
        });
        assert_eq!(exit_code(&shape), 4);

        let table = anyhow::Error::from(CliError::InvalidTable("bad".to_string()));
        assert_eq!(exit_code(&table), 4);

        let registry = anyhow::Error::from(RegistryError::UnsupportedSchemaVersion(9));
        assert_eq!(exit_code(&registry), 5);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
