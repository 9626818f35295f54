//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for the settings schema.
    #[error("failed to parse settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required value is absent from every layer.
    #[error("missing required setting {key}")]
    Missing { key: &'static str },

    /// A value is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    /// Message suitable for the status area or terminal.
    pub fn user_message(&self) -> String {
        match self {
            Self::Missing { key } => {
                format!("Configuration is incomplete: set {key} in the environment or settings file.")
            }
            other => format!("Configuration error: {other}"),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
