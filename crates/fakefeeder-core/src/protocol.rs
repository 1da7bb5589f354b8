//! The atomic update protocol and the seeding plan.
//!
//! A single update touches four store structures. They must change together:
//! a reader can never see a bumped score without the matching history entry.
//! The effects therefore live in a server-side [`StoredProcedure`], registered
//! once per feeder and invoked by [`ProcedureHandle`] afterwards.
//!
//! Seeding is different. It runs once, before anyone reads, so it is
//! expressed as plain data ([`SeedPlan`]) that a store applies with batched
//! transactions.

use std::fmt;

use crate::keys::HISTORY_LIMIT;
use crate::ranking::{RankingEntry, RankingSnapshot};
use crate::synth::Synthesizer;

/// Reply the update procedure returns on success.
pub const SUCCESS_SENTINEL: i64 = 1;

/// Lua body of the update procedure.
///
/// `ARGV[1]` is the glyph id, `ARGV[2]` the serialized record. No `KEYS`
/// are passed; key names are derived server-side from the glyph id.
const UPDATE_SCRIPT: &str = r"
local glyph_id = ARGV[1]
local record   = ARGV[2]

redis.call('ZINCRBY', 'emojitrack_score', 1, glyph_id)
redis.call('PUBLISH', 'stream.score_updates', glyph_id)

local history_key = 'emojitrack_tweets_' .. glyph_id
redis.call('LPUSH', history_key, record)
redis.call('LTRIM', history_key, 0, 9)

redis.call('PUBLISH', 'stream.tweet_updates.' .. glyph_id, record)

return 1
";

/// A named, versioned server-side script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredProcedure {
    /// Stable procedure name.
    pub name: &'static str,
    /// Bumped whenever the body changes meaning.
    pub version: u32,
    /// Script source sent to the store at registration.
    pub body: &'static str,
}

impl fmt::Display for StoredProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.name, self.version)
    }
}

/// Reference to a procedure that has been registered with a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureHandle {
    name: &'static str,
    version: u32,
    digest: String,
}

impl ProcedureHandle {
    /// Create a handle for `procedure` with the store-assigned `digest`.
    pub fn new(procedure: &StoredProcedure, digest: impl Into<String>) -> Self {
        Self {
            name: procedure.name,
            version: procedure.version,
            digest: digest.into(),
        }
    }

    /// Procedure name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Procedure version.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Store-side identifier (the script SHA1 for Redis).
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for ProcedureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{} ({})", self.name, self.version, self.digest)
    }
}

/// The update protocol: one atomic unit per synthesized record.
///
/// Effects, in order:
///
/// 1. increment the glyph's score in `emojitrack_score` by 1
/// 2. publish the glyph id on `stream.score_updates`
/// 3. prepend the record to `emojitrack_tweets_{id}`
/// 4. trim that list to the latest 10
/// 5. publish the record on `stream.tweet_updates.{id}`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProtocol;

impl UpdateProtocol {
    /// The procedure implementing the protocol.
    pub const fn procedure() -> StoredProcedure {
        StoredProcedure {
            name: "emojitrack_update",
            version: 1,
            body: UPDATE_SCRIPT,
        }
    }
}

/// History records to push for one glyph during seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBatch {
    /// Glyph the records belong to.
    pub glyph_id: String,
    /// Serialized records in push order; the last one ends up at the head.
    pub records: Vec<String>,
}

/// Everything the seeding path writes.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    scores: Vec<RankingEntry>,
    history: Vec<HistoryBatch>,
}

impl SeedPlan {
    /// Plan seeding for `snapshot`: every score set directly, plus
    /// [`HISTORY_LIMIT`] synthetic records per glyph.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if a synthesized record fails to encode.
    pub fn build(
        snapshot: &RankingSnapshot,
        synthesizer: &Synthesizer,
    ) -> Result<Self, serde_json::Error> {
        let mut history = Vec::with_capacity(snapshot.len());
        for entry in snapshot.entries() {
            let records = (0..HISTORY_LIMIT)
                .map(|_| synthesizer.synthesize(entry).encode())
                .collect::<Result<Vec<_>, _>>()?;
            history.push(HistoryBatch {
                glyph_id: entry.id.clone(),
                records,
            });
        }

        Ok(Self {
            scores: snapshot.entries().to_vec(),
            history,
        })
    }

    /// Entries whose scores are set verbatim.
    pub fn scores(&self) -> &[RankingEntry] {
        &self.scores
    }

    /// History batches, one per glyph.
    pub fn history(&self) -> &[HistoryBatch] {
        &self.history
    }
}
