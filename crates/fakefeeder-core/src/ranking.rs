//! Ranking snapshot: the static popularity data the feeder seeds from.
//!
//! The JSON shape matches the Emojitracker rankings API (`char`, `id`,
//! `name`, `score`), so a snapshot captured from the live API can be dropped
//! in place of the embedded one.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Snapshot baked into the binary.
const EMBEDDED_SNAPSHOT: &str = include_str!("../data/snapshot.json");

/// One glyph and its seed popularity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// The emoji character itself.
    #[serde(rename = "char")]
    pub glyph: String,
    /// Stable codepoint-derived identifier, e.g. `1F602`.
    pub id: String,
    /// Unicode name of the glyph.
    pub name: String,
    /// Seed popularity score.
    pub score: u64,
}

impl RankingEntry {
    /// Create a ranking entry.
    pub fn new(glyph: &str, id: &str, name: &str, score: u64) -> Self {
        Self {
            glyph: glyph.to_owned(),
            id: id.to_owned(),
            name: name.to_owned(),
            score,
        }
    }
}

/// Immutable, fixed-order collection of [`RankingEntry`] values.
///
/// Cloning is cheap; all clones share the same backing slice.
#[derive(Debug, Clone)]
pub struct RankingSnapshot {
    entries: Arc<[RankingEntry]>,
}

impl RankingSnapshot {
    /// Build a snapshot from entries, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateId`] if two entries share an id.
    pub fn from_entries(entries: Vec<RankingEntry>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self {
            entries: entries.into(),
        })
    }

    /// Parse a snapshot from rankings API JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SnapshotJson`] for malformed JSON (including
    /// negative scores) and [`ConfigError::DuplicateId`] for repeated ids.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<RankingEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SnapshotIo`] if the file cannot be read, plus
    /// everything [`from_json`](Self::from_json) can return.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The snapshot shipped with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded asset itself is corrupt.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_SNAPSHOT)
    }

    /// All entries in snapshot order.
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by glyph id.
    pub fn get(&self, id: &str) -> Option<&RankingEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Sum of all seed scores, saturating at `u64::MAX`.
    pub fn total_score(&self) -> u64 {
        self.entries
            .iter()
            .fold(0_u64, |acc, e| acc.saturating_add(e.score))
    }
}
