//! # Export Error Types
//!
//! All errors that can occur between receiving a mesh snapshot and having a
//! `.vox` file on disk.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of an [`ExportError`].
///
/// Callers that only need to decide "fix the input" vs "report a bug" vs
/// "check the disk" match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed something unusable.
    InvalidParameter,
    /// Parameters were fine but nothing was voxelized.
    EmptyResult,
    /// A broken internal guarantee. Always a bug.
    InternalInvariantViolation,
    /// The destination could not be created or written.
    IoFailure,
}

/// Errors that can occur during an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Bad edge length, no triangles, non-mesh input, bad output path.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Valid parameters, zero voxels produced.
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// A partitioned model exceeded the format limits.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// Destination file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    IoFailure {
        /// File that was being written.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::InternalInvariantViolation(_) => ErrorKind::InternalInvariantViolation,
            Self::IoFailure { .. } => ErrorKind::IoFailure,
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidParameter(detail.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
