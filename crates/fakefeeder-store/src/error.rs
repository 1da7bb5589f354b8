//! Error types for the store layer.
//!
//! [`DbError`] wraps the underlying [`fred`] errors with context about what
//! failed, and converts into the core's
//! [`StoreError`](fakefeeder_core::StoreError) at the trait boundary.

use fakefeeder_core::StoreError;

/// Errors that can occur talking to Redis.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A Redis command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// The target URL or pool settings are unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::backend(err)
    }
}
