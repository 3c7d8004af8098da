//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ConfigError;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The home directory could not be determined.
    #[error("could not determine the home directory")]
    NoHomeDirectory,

    /// Reading or writing the settings file failed.
    #[error("settings file {path:?}: {source}")]
    Io {
        /// Settings file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`super::Settings`].
    #[error("malformed settings file {path:?}: {source}")]
    Parse {
        /// Settings file path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The settings parsed but describe an invalid engine configuration.
    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

impl SettingsError {
    /// Returns true if the error comes from file contents rather than I/O.
    #[must_use]
    pub fn is_content_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Invalid(_))
    }
}
