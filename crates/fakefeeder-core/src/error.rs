//! Error types for the feeder core.
//!
//! Errors fall into four families, each with its own propagation rule:
//!
//! - [`ConfigError`] -- bad snapshot or chooser input. Fatal before any store
//!   I/O happens.
//! - [`StoreError`] -- a store operation failed. Surfaces wrapped in one of
//!   the other two families depending on where it happened.
//! - [`FeederError`] -- construction failed. No [`Feeder`] is returned.
//! - [`UpdateError`] -- a single update failed. Reported through the bounded
//!   error conduit; only [`UpdateError::Encode`] stops the scheduled loop.
//!
//! [`Feeder`]: crate::feeder::Feeder

use std::fmt;

/// Errors in ranking data or chooser configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A chooser was requested over a snapshot with no entries.
    #[error("ranking snapshot is empty")]
    EmptyRanking,

    /// Weighted selection was requested but every entry has a zero score.
    #[error("weighted selection requires at least one entry with a positive score")]
    ZeroWeights,

    /// The cumulative weight table could not be built.
    #[error("invalid selection weights: {0}")]
    InvalidWeights(String),

    /// Two snapshot entries share the same glyph id.
    #[error("duplicate glyph id in ranking snapshot: {0}")]
    DuplicateId(String),

    /// The snapshot file could not be read.
    #[error("failed to read ranking snapshot: {source}")]
    SnapshotIo {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The snapshot content is not valid ranking JSON.
    #[error("failed to parse ranking snapshot: {source}")]
    SnapshotJson {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Errors raised by a store connection or connection provider.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store client reported an error.
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No connection could be checked out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The procedure handle is not registered with the store.
    #[error("unknown stored procedure: {0}")]
    UnknownProcedure(String),

    /// The store answered with something other than the success sentinel.
    #[error("unexpected reply from store: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// The construction phase in which seeding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPhase {
    /// Checking out the seeding connection.
    Checkout,
    /// Bulk score initialization.
    Scores,
    /// Bulk history seeding.
    History,
    /// Registering the update procedure.
    Registration,
}

impl fmt::Display for SeedPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Checkout => "connection checkout",
            Self::Scores => "initial scores",
            Self::History => "initial history",
            Self::Registration => "update procedure registration",
        };
        f.write_str(name)
    }
}

/// Errors that prevent a [`Feeder`](crate::feeder::Feeder) from being built.
#[derive(Debug, thiserror::Error)]
pub enum FeederError {
    /// The snapshot or chooser configuration is invalid.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// Seeding the store failed partway.
    #[error("could not seed {phase}: {source}")]
    Seed {
        /// Which seeding phase failed.
        phase: SeedPhase,
        /// The underlying store error.
        source: StoreError,
    },

    /// A synthesized seed record could not be encoded.
    #[error("could not encode seed record: {source}")]
    Encode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

impl FeederError {
    /// The seeding phase that failed, if this is a seeding error.
    pub const fn phase(&self) -> Option<SeedPhase> {
        match self {
            Self::Seed { phase, .. } => Some(*phase),
            Self::Config { .. } | Self::Encode { .. } => None,
        }
    }
}

/// Errors from a single update attempt.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// No connection could be checked out for this update.
    #[error("could not check out store connection: {source}")]
    Checkout {
        /// The underlying store error.
        source: StoreError,
    },

    /// The update procedure failed to execute.
    #[error("update procedure failed for glyph {glyph_id}: {source}")]
    Invoke {
        /// The glyph the update was for.
        glyph_id: String,
        /// The underlying store error.
        source: StoreError,
    },

    /// The synthesized record could not be encoded. Never retried.
    #[error("could not encode update record: {source}")]
    Encode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The scheduled loop was cancelled.
    #[error("feeder run cancelled")]
    Cancelled,
}

impl UpdateError {
    /// Whether this error must stop the scheduled loop.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }
}
