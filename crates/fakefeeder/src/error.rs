//! Error types for the feeder binary.
//!
//! Everything that can stop the process before or after the run loop:
//! configuration, snapshot loading, the Redis pool, and seeding.

use fakefeeder_core::{ConfigError, FeederError};
use fakefeeder_store::DbError;

/// Errors that can terminate the feeder process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// The ranking snapshot could not be loaded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] ConfigError),

    /// Connecting the Redis pool failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// Seeding the store failed.
    #[error("feeder error: {0}")]
    Feeder(#[from] FeederError),

    /// The run loop task panicked or was aborted.
    #[error("run loop terminated abnormally: {0}")]
    Join(#[from] tokio::task::JoinError),
}
