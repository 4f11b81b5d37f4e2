//! Export options.
//!
//! ```toml
//! voxel_edge_length = 0.5
//! parallel = true
//! ```
//!
//! Both keys are optional. Unknown keys are rejected so a typo does not
//! silently fall back to a default.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default voxel edge length in world units.
pub const DEFAULT_EDGE_LENGTH: f64 = 1.0;

/// Errors from loading [`ExportOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The TOML did not parse or had unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Options for one export run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Voxel edge length in world units. Must be finite and > 0.
    pub voxel_edge_length: f64,
    /// Use the rayon voxelizer. Output is identical either way.
    pub parallel: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            voxel_edge_length: DEFAULT_EDGE_LENGTH,
            parallel: false,
        }
    }
}

impl ExportOptions {
    /// Default options with the given edge length.
    #[must_use]
    pub fn with_edge_length(voxel_edge_length: f64) -> Self {
        Self {
            voxel_edge_length,
            ..Self::default()
        }
    }

    /// Parses options from TOML text and validates them.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] on an out-of-range value.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ExportOptions::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?options, "loaded export options");
        Ok(options)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the edge length is not finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.voxel_edge_length.is_finite() && self.voxel_edge_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "voxel_edge_length must be finite and > 0, got {}",
                self.voxel_edge_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let options = ExportOptions::from_toml_str("").unwrap();
        assert_eq!(options, ExportOptions::default());
        assert_eq!(options.voxel_edge_length, 1.0);
        assert!(!options.parallel);
    }

    #[test]
    fn test_overrides() {
        let options =
            ExportOptions::from_toml_str("voxel_edge_length = 0.25\nparallel = true\n").unwrap();
        assert_eq!(options.voxel_edge_length, 0.25);
        assert!(options.parallel);
    }

    #[test]
    fn test_rejects_non_positive_edge() {
        for text in [
            "voxel_edge_length = 0.0",
            "voxel_edge_length = -2.0",
            "voxel_edge_length = nan",
        ] {
            assert!(matches!(
                ExportOptions::from_toml_str(text),
                Err(ConfigError::Invalid(_))
            ));
        }
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            ExportOptions::from_toml_str("voxel_size = 2.0"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("voxelbake-no-such-config.toml");
        assert!(matches!(ExportOptions::load(&path), Err(ConfigError::Io { .. })));
    }
}
