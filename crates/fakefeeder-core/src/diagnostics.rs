//! Optional per-update diagnostics.
//!
//! The feeder reports each successful update to a [`DiagnosticSink`]. The
//! default [`NoopSink`] discards them; [`TracingSink`] turns them into
//! `tracing` events for verbose runs.

use tracing::debug;

/// Something worth telling an operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// An update was applied to the store.
    UpdateSent {
        /// Glyph id the update was for.
        glyph_id: String,
        /// The glyph itself.
        glyph: String,
        /// Unicode name of the glyph.
        name: String,
        /// Id of the synthesized record.
        record_id: String,
    },
}

/// Receives [`DiagnosticEvent`]s.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event. Must not block.
    fn record(&self, event: &DiagnosticEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _event: &DiagnosticEvent) {}
}

/// Emits every event at `debug` level, or `info` when `loud` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    loud: bool,
}

impl TracingSink {
    /// A sink logging at `debug`.
    pub const fn new() -> Self {
        Self { loud: false }
    }

    /// A sink logging at `info`, for the verbose flag.
    pub const fn loud() -> Self {
        Self { loud: true }
    }
}

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::UpdateSent {
                glyph_id,
                glyph,
                name,
                record_id,
            } => {
                if self.loud {
                    tracing::info!(glyph_id, glyph, name, record_id, "sent fake update");
                } else {
                    debug!(glyph_id, glyph, name, record_id, "sent fake update");
                }
            }
        }
    }
}
