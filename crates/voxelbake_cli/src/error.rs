//! Errors surfaced by the command line front end.

use std::path::PathBuf;

use thiserror::Error;
use voxelbake_core::{ConfigError, ExportError, VoxError};

/// Everything that can make a `voxelbake` invocation fail.
#[derive(Debug, Error)]
pub enum CliError {
    /// The export itself failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The `--config` file could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The OBJ (or its MTL) could not be loaded.
    #[error("failed to load OBJ {}: {source}", path.display())]
    Obj {
        /// OBJ path.
        path: PathBuf,
        /// Loader error.
        #[source]
        source: tobj::LoadError,
    },

    /// The OBJ loaded but references data it does not contain.
    #[error("invalid mesh in {}: {detail}", path.display())]
    InvalidMesh {
        /// OBJ path.
        path: PathBuf,
        /// What was wrong.
        detail: String,
    },

    /// A `.vox` file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Vox {
        /// `.vox` path.
        path: PathBuf,
        /// Reader error.
        #[source]
        source: VoxError,
    },
}
