//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config from {path}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config body is neither valid TOML nor valid JSON.
    #[error("failed to parse config {origin}: {message}")]
    Parse {
        /// File path or environment variable the body came from.
        origin: String,
        /// Parser message.
        message: String,
    },

    /// The config parsed but breaks a rule, such as a zero timeout.
    #[error("invalid config: {0}")]
    Invalid(String),
}
