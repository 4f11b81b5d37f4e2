//! # voxelbake
//!
//! Voxelizes OBJ meshes into MagicaVoxel `.vox` files.
//!
//! ```bash
//! # Export with 0.5 unit voxels on all cores
//! voxelbake export ship.obj -o out/ship.vox --edge 0.5 --parallel
//!
//! # Options from a file, flags still win
//! voxelbake export ship.obj -o out/ship.vox --config bake.toml
//!
//! # What ended up in the file
//! voxelbake inspect out/ship.vox
//! ```
//!
//! Logging goes through `RUST_LOG` (default `info`).

mod error;
mod inspect;
mod obj;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use voxelbake_core::{export_to_file, ExportOptions, VoxReader};

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "voxelbake", version, about = "Voxelize OBJ meshes into MagicaVoxel .vox files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Voxelize an OBJ mesh and write a .vox file
    Export {
        /// Input .obj file (its mtllib is loaded too)
        input: PathBuf,
        /// Output .vox file path
        #[arg(long, short)]
        output: PathBuf,
        /// Voxel edge length in world units
        #[arg(long)]
        edge: Option<f64>,
        /// Voxelize on all cores (same output)
        #[arg(long)]
        parallel: bool,
        /// TOML file with export options
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print models, placement and palette of a .vox file
    Inspect {
        /// Input .vox file
        input: PathBuf,
    },
}

/// Config file first, then command line flags on top.
fn resolve_options(
    config: Option<&Path>,
    edge: Option<f64>,
    parallel: bool,
) -> Result<ExportOptions, CliError> {
    let mut options = match config {
        Some(path) => ExportOptions::load(path)?,
        None => ExportOptions::default(),
    };
    if let Some(edge) = edge {
        options.voxel_edge_length = edge;
    }
    if parallel {
        options.parallel = true;
    }
    Ok(options)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Export {
            input,
            output,
            edge,
            parallel,
            config,
        } => {
            let options = resolve_options(config.as_deref(), edge, parallel)?;
            let snapshot = obj::load_snapshot(&input)?;
            tracing::info!(
                input = %input.display(),
                triangles = snapshot.triangles.len(),
                edge = options.voxel_edge_length,
                parallel = options.parallel,
                "exporting"
            );
            let summary = export_to_file(&snapshot, &output, &options)?;
            tracing::info!(
                output = %output.display(),
                palette = summary.palette_len,
                bytes = summary.byte_len,
                "{summary}"
            );
        }
        Command::Inspect { input } => {
            let scene = VoxReader::load(&input).map_err(|source| CliError::Vox {
                path: input.clone(),
                source,
            })?;
            print!("{}", inspect::report(&scene));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "voxelbake", "export", "ship.obj", "-o", "ship.vox", "--edge", "0.5", "--parallel",
        ])
        .unwrap();
        match cli.command {
            Command::Export {
                input,
                output,
                edge,
                parallel,
                config,
            } => {
                assert_eq!(input, PathBuf::from("ship.obj"));
                assert_eq!(output, PathBuf::from("ship.vox"));
                assert_eq!(edge, Some(0.5));
                assert!(parallel);
                assert_eq!(config, None);
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_export_requires_output() {
        assert!(Cli::try_parse_from(["voxelbake", "export", "ship.obj"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let path = std::env::temp_dir()
            .join(format!("voxelbake-cli-{}-bake.toml", std::process::id()));
        std::fs::write(&path, "voxel_edge_length = 2.0\n").unwrap();

        let from_file = resolve_options(Some(&path), None, false).unwrap();
        assert_eq!(from_file.voxel_edge_length, 2.0);
        assert!(!from_file.parallel);

        let overridden = resolve_options(Some(&path), Some(0.25), true).unwrap();
        assert_eq!(overridden.voxel_edge_length, 0.25);
        assert!(overridden.parallel);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let path = std::env::temp_dir()
            .join(format!("voxelbake-cli-{}-bad.toml", std::process::id()));
        std::fs::write(&path, "voxel_edge_length = -1.0\n").unwrap();
        assert!(matches!(
            resolve_options(Some(&path), None, false),
            Err(CliError::Config(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
