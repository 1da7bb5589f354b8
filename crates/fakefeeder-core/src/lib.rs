//! Update engine for the Emojitracker fake feeder.
//!
//! The feeder emulates the real Emojitracker feeder without a firehose: it
//! picks glyphs from a static ranking snapshot, synthesizes plausible
//! activity records for them, and applies each one to a Redis-compatible
//! store through a single atomic server-side procedure, at a fixed rate.
//!
//! # Architecture
//!
//! ```text
//! RankingSnapshot ──▶ WeightedChooser ──▶ Synthesizer ──▶ UpdateProtocol
//!        │                                                     │
//!        └──── seed once ────▶ Feeder ◀── checkout per op ── ConnectionProvider
//!                                │
//!                                └── errors ──▶ bounded conduit (drop on full)
//! ```
//!
//! # Modules
//!
//! - [`ranking`] -- [`RankingEntry`] and the immutable [`RankingSnapshot`].
//! - [`chooser`] -- Uniform or score-weighted glyph selection.
//! - [`lexicon`] -- Placeholder text via the [`TextSource`] trait.
//! - [`synth`] -- [`UpdateRecord`] wire format and the id-owning
//!   [`Synthesizer`].
//! - [`keys`] -- Store key and channel names.
//! - [`protocol`] -- The atomic update procedure and the seeding plan.
//! - [`store`] -- [`ConnectionProvider`] and [`StoreConnection`] traits.
//! - [`memory`] -- In-process [`MemoryStore`] for tests and harnesses.
//! - [`diagnostics`] -- Optional per-update [`DiagnosticSink`].
//! - [`cancel`] -- [`CancellationToken`] for the scheduled loop.
//! - [`feeder`] -- The [`Feeder`] lifecycle.
//! - [`error`] -- Error types.

pub mod cancel;
pub mod chooser;
pub mod diagnostics;
pub mod error;
pub mod feeder;
pub mod keys;
pub mod lexicon;
pub mod memory;
pub mod protocol;
pub mod ranking;
pub mod store;
pub mod synth;

// Re-export primary types for convenience.
pub use cancel::CancellationToken;
pub use chooser::{SelectionMode, WeightedChooser};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, NoopSink, TracingSink};
pub use error::{ConfigError, FeederError, SeedPhase, StoreError, UpdateError};
pub use feeder::{ERROR_CONDUIT_CAPACITY, Feeder, RunHandle, RunSummary, UpdateOutcome};
pub use lexicon::{Lexicon, TextSource};
pub use memory::MemoryStore;
pub use protocol::{HistoryBatch, ProcedureHandle, SeedPlan, StoredProcedure, UpdateProtocol};
pub use ranking::{RankingEntry, RankingSnapshot};
pub use store::{ConnectionProvider, StoreConnection};
pub use synth::{Synthesizer, UpdateRecord};
