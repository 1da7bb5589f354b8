//! Random glyph selection over a ranking snapshot.
//!
//! Weighted mode precomputes a cumulative weight table once
//! ([`WeightedIndex`]), so each draw is a binary search. The weights are the
//! seed scores and never change: the store's live score grows with every
//! update, but selection deliberately keeps using the snapshot.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::{self, WeightedIndex};

use crate::error::ConfigError;
use crate::ranking::{RankingEntry, RankingSnapshot};

/// How entries are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every entry equally likely.
    Uniform,
    /// Probability proportional to seed score.
    Weighted,
}

impl SelectionMode {
    /// Map the `weighted` flag onto a mode.
    pub const fn from_flag(weighted: bool) -> Self {
        if weighted { Self::Weighted } else { Self::Uniform }
    }
}

#[derive(Debug)]
enum Table {
    Uniform,
    Weighted(WeightedIndex<u64>),
}

/// Draws ranking entries, uniformly or by seed score.
///
/// Read-only after construction and `Sync`, so the scheduled loop and manual
/// callers can share one instance.
#[derive(Debug)]
pub struct WeightedChooser {
    snapshot: RankingSnapshot,
    table: Table,
}

impl WeightedChooser {
    /// Build a chooser over `snapshot`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyRanking`] if the snapshot has no entries.
    /// - [`ConfigError::ZeroWeights`] in weighted mode when every score is 0.
    /// - [`ConfigError::InvalidWeights`] if the weight sum overflows.
    pub fn build(snapshot: RankingSnapshot, weighted: bool) -> Result<Self, ConfigError> {
        Self::with_mode(snapshot, SelectionMode::from_flag(weighted))
    }

    /// Build a chooser with an explicit [`SelectionMode`].
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn with_mode(snapshot: RankingSnapshot, mode: SelectionMode) -> Result<Self, ConfigError> {
        if snapshot.is_empty() {
            return Err(ConfigError::EmptyRanking);
        }

        let table = match mode {
            SelectionMode::Uniform => Table::Uniform,
            SelectionMode::Weighted => {
                let weights = snapshot.entries().iter().map(|e| e.score);
                let index = WeightedIndex::new(weights).map_err(|e| match e {
                    weighted::Error::InsufficientNonZero => ConfigError::ZeroWeights,
                    other => ConfigError::InvalidWeights(other.to_string()),
                })?;
                Table::Weighted(index)
            }
        };

        Ok(Self { snapshot, table })
    }

    /// The selection mode in use.
    pub const fn mode(&self) -> SelectionMode {
        match self.table {
            Table::Uniform => SelectionMode::Uniform,
            Table::Weighted(_) => SelectionMode::Weighted,
        }
    }

    /// The snapshot being drawn from.
    pub const fn snapshot(&self) -> &RankingSnapshot {
        &self.snapshot
    }

    /// Draw one entry using the thread-local RNG.
    pub fn choose(&self) -> &RankingEntry {
        self.choose_with(&mut rand::rng())
    }

    /// Draw one entry using `rng`.
    #[allow(clippy::indexing_slicing)] // both tables only yield indices in 0..len
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &RankingEntry {
        let entries = self.snapshot.entries();
        let idx = match &self.table {
            Table::Uniform => rng.random_range(0..entries.len()),
            Table::Weighted(index) => index.sample(rng),
        };
        &entries[idx]
    }
}
