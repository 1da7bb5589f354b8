//! The feeder: seeds the store once, then pushes synthetic updates.
//!
//! # Lifecycle
//!
//! ```text
//! Feeder::new ──seed scores──seed history──register procedure──▶ Seeded
//!     │                                                            │
//!     └── any failure: FeederError, no Feeder                      │ run(token, period)
//!                                                                  ▼
//!                                                               Running ──token.cancel()──▶ Stopped
//! ```
//!
//! While running, one background task fires [`Feeder::update`] once per
//! period. Per-update failures go to a bounded conduit with
//! [`ERROR_CONDUIT_CAPACITY`] slots; when it is full they are dropped, never
//! awaited, so an owner that stops reading cannot stall the loop. Manual
//! [`Feeder::update`] calls may run alongside the loop.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::cancel::CancellationToken;
use crate::chooser::{SelectionMode, WeightedChooser};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, NoopSink};
use crate::error::{FeederError, SeedPhase, UpdateError};
use crate::protocol::{ProcedureHandle, SeedPlan, UpdateProtocol};
use crate::ranking::RankingSnapshot;
use crate::store::{ConnectionProvider, StoreConnection};
use crate::synth::Synthesizer;

/// Slots in the per-run error conduit.
pub const ERROR_CONDUIT_CAPACITY: usize = 8;

/// Shortest period the scheduled loop accepts; shorter ones are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_micros(1);

/// Result of one successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Glyph the update was for.
    pub glyph_id: String,
    /// Id of the published record.
    pub record_id: String,
}

/// Counters for one scheduled run, returned when the task ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Updates applied to the store.
    pub updates_sent: u64,
    /// Update attempts that failed.
    pub updates_failed: u64,
    /// Errors (including the cancellation notice) dropped because the
    /// conduit was full.
    pub errors_dropped: u64,
}

impl RunSummary {
    fn report(&mut self, errors: &mpsc::Sender<UpdateError>, err: UpdateError) {
        if errors.try_send(err).is_err() {
            self.errors_dropped = self.errors_dropped.saturating_add(1);
        }
    }
}

/// Handle to a running scheduled loop.
#[derive(Debug)]
pub struct RunHandle {
    /// Per-update errors, then [`UpdateError::Cancelled`]; closed when the
    /// loop ends. Delivery is best-effort.
    pub errors: mpsc::Receiver<UpdateError>,
    /// The background task.
    pub task: JoinHandle<RunSummary>,
}

/// Publishes synthetic updates to a store.
pub struct Feeder<P: ConnectionProvider> {
    provider: P,
    chooser: WeightedChooser,
    synthesizer: Synthesizer,
    procedure: ProcedureHandle,
    diagnostics: RwLock<Arc<dyn DiagnosticSink>>,
}

impl<P: ConnectionProvider> Feeder<P> {
    /// Build a feeder and seed the store from `snapshot`.
    ///
    /// `weighted` picks score-proportional selection instead of uniform.
    ///
    /// # Errors
    ///
    /// Returns [`FeederError::Config`] for an unusable snapshot (checked
    /// before any store I/O) and [`FeederError::Seed`] naming the phase that
    /// failed otherwise.
    pub async fn new(
        provider: P,
        snapshot: RankingSnapshot,
        weighted: bool,
    ) -> Result<Self, FeederError> {
        Self::with_synthesizer(provider, snapshot, weighted, Synthesizer::new()).await
    }

    /// Like [`new`](Self::new) with a caller-supplied [`Synthesizer`].
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub async fn with_synthesizer(
        provider: P,
        snapshot: RankingSnapshot,
        weighted: bool,
        synthesizer: Synthesizer,
    ) -> Result<Self, FeederError> {
        let chooser = WeightedChooser::build(snapshot, weighted)?;
        let procedure = seed(&provider, chooser.snapshot(), &synthesizer).await?;

        info!(
            glyphs = chooser.snapshot().len(),
            weighted = chooser.mode() == SelectionMode::Weighted,
            procedure = %procedure,
            "feeder seeded"
        );

        Ok(Self {
            provider,
            chooser,
            synthesizer,
            procedure,
            diagnostics: RwLock::new(Arc::new(NoopSink)),
        })
    }

    /// The seed snapshot.
    pub const fn snapshot(&self) -> &RankingSnapshot {
        self.chooser.snapshot()
    }

    /// The chooser used for every update.
    pub const fn chooser(&self) -> &WeightedChooser {
        &self.chooser
    }

    /// The synthesizer used for every update.
    pub const fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    /// Handle of the registered update procedure.
    pub const fn procedure(&self) -> &ProcedureHandle {
        &self.procedure
    }

    /// The connection provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Replace the diagnostic sink. Takes effect from the next update.
    pub fn set_diagnostics(&self, sink: Arc<dyn DiagnosticSink>) {
        let mut guard = self
            .diagnostics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = sink;
    }

    fn diagnostics(&self) -> Arc<dyn DiagnosticSink> {
        let guard = self
            .diagnostics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Send one random update.
    ///
    /// Chooses a glyph, synthesizes a record, and invokes the update
    /// procedure on a freshly checked-out connection, which is released
    /// before this returns on every path.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Encode`] (fatal), [`UpdateError::Checkout`], or
    /// [`UpdateError::Invoke`]. Nothing is retried.
    pub async fn update(&self) -> Result<UpdateOutcome, UpdateError> {
        let entry = self.chooser.choose();
        let record = self.synthesizer.synthesize(entry);
        let payload = record
            .encode()
            .map_err(|source| UpdateError::Encode { source })?;

        let mut conn = self
            .provider
            .checkout()
            .await
            .map_err(|source| UpdateError::Checkout { source })?;
        conn.invoke(&self.procedure, &entry.id, &payload)
            .await
            .map_err(|source| UpdateError::Invoke {
                glyph_id: entry.id.clone(),
                source,
            })?;
        drop(conn);

        self.diagnostics().record(&DiagnosticEvent::UpdateSent {
            glyph_id: entry.id.clone(),
            glyph: entry.glyph.clone(),
            name: entry.name.clone(),
            record_id: record.id.clone(),
        });

        Ok(UpdateOutcome {
            glyph_id: entry.id.clone(),
            record_id: record.id,
        })
    }

    /// Start the scheduled loop: one [`update`](Self::update) per `period`,
    /// the first one a full period from now, until `token` is cancelled.
    ///
    /// Must be called within a tokio runtime.
    pub fn run(self: &Arc<Self>, token: CancellationToken, period: Duration) -> RunHandle {
        let (tx, rx) = mpsc::channel(ERROR_CONDUIT_CAPACITY);
        let feeder = Arc::clone(self);
        let task = tokio::spawn(async move { feeder.run_loop(token, period, tx).await });
        RunHandle { errors: rx, task }
    }

    async fn run_loop(
        &self,
        token: CancellationToken,
        period: Duration,
        errors: mpsc::Sender<UpdateError>,
    ) -> RunSummary {
        let period = if period < MIN_PERIOD {
            warn!(requested = ?period, used = ?MIN_PERIOD, "feeder period too short, raised");
            MIN_PERIOD
        } else {
            period
        };

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval() fires immediately; push the first tick out one period.
        ticker.reset();

        let mut summary = RunSummary::default();
        info!(period = ?period, "feeder run loop started");

        loop {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    summary.report(&errors, UpdateError::Cancelled);
                    break;
                }

                _ = ticker.tick() => match self.update().await {
                    Ok(_) => {
                        summary.updates_sent = summary.updates_sent.saturating_add(1);
                    }
                    Err(err) => {
                        summary.updates_failed = summary.updates_failed.saturating_add(1);
                        let fatal = err.is_fatal();
                        if fatal {
                            error!(error = %err, "unencodable update record, stopping feeder");
                        }
                        summary.report(&errors, err);
                        if fatal {
                            break;
                        }
                    }
                },
            }
        }

        info!(
            updates_sent = summary.updates_sent,
            updates_failed = summary.updates_failed,
            errors_dropped = summary.errors_dropped,
            "feeder run loop stopped"
        );
        summary
    }
}

/// Seed scores and history, then register the update procedure, all on one
/// connection.
async fn seed<P: ConnectionProvider>(
    provider: &P,
    snapshot: &RankingSnapshot,
    synthesizer: &Synthesizer,
) -> Result<ProcedureHandle, FeederError> {
    let plan =
        SeedPlan::build(snapshot, synthesizer).map_err(|source| FeederError::Encode { source })?;

    let mut conn = provider
        .checkout()
        .await
        .map_err(|source| FeederError::Seed {
            phase: SeedPhase::Checkout,
            source,
        })?;

    info!(glyphs = plan.scores().len(), "setting initial scores");
    conn.seed_scores(plan.scores())
        .await
        .map_err(|source| FeederError::Seed {
            phase: SeedPhase::Scores,
            source,
        })?;

    info!(
        glyphs = plan.history().len(),
        "mocking initial history for each glyph"
    );
    conn.seed_history(plan.history())
        .await
        .map_err(|source| FeederError::Seed {
            phase: SeedPhase::History,
            source,
        })?;

    let procedure = UpdateProtocol::procedure();
    conn.register(&procedure)
        .await
        .map_err(|source| FeederError::Seed {
            phase: SeedPhase::Registration,
            source,
        })
}
