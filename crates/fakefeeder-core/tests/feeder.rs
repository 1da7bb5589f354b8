//! Lifecycle tests for the feeder against the in-memory store.
//!
//! Time-driven tests run on a paused tokio clock, so every scheduled tick is
//! deterministic and the suite finishes instantly.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_precision_loss,
    clippy::arithmetic_side_effects
)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fakefeeder_core::keys::{HISTORY_LIMIT, SCORE_CHANNEL, record_channel};
use fakefeeder_core::memory::Fault;
use fakefeeder_core::synth::RECORD_ID_STEP;
use fakefeeder_core::{
    CancellationToken, ConfigError, DiagnosticEvent, DiagnosticSink, ERROR_CONDUIT_CAPACITY,
    Feeder, FeederError, MemoryStore, RankingEntry, RankingSnapshot, SeedPhase, UpdateError,
    UpdateRecord,
};

const PERIOD: Duration = Duration::from_millis(10);

fn snapshot(entries: &[(&str, &str, u64)]) -> RankingSnapshot {
    RankingSnapshot::from_entries(
        entries
            .iter()
            .map(|(glyph, id, score)| RankingEntry::new(glyph, id, "TEST GLYPH", *score))
            .collect(),
    )
    .expect("unique ids")
}

fn single_glyph() -> RankingSnapshot {
    snapshot(&[("🔥", "1F525", 7)])
}

async fn seeded(
    store: &MemoryStore,
    snapshot: RankingSnapshot,
    weighted: bool,
) -> Arc<Feeder<MemoryStore>> {
    Arc::new(
        Feeder::new(store.clone(), snapshot, weighted)
            .await
            .expect("seeding succeeds"),
    )
}

async fn drain(errors: &mut tokio::sync::mpsc::Receiver<UpdateError>) -> Vec<UpdateError> {
    let mut out = Vec::new();
    while let Some(err) = errors.recv().await {
        out.push(err);
    }
    out
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: &DiagnosticEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// =============================================================================
// Seeding
// =============================================================================

#[tokio::test]
async fn seeding_sets_scores_history_and_registers_procedure() {
    let store = MemoryStore::new();
    let snap = snapshot(&[("🔥", "1F525", 12), ("✨", "2728", 0)]);
    let feeder = seeded(&store, snap, true).await;

    assert_eq!(store.score("1F525"), Some(12));
    assert_eq!(store.score("2728"), Some(0));
    assert_eq!(store.history("1F525").len(), HISTORY_LIMIT);
    assert_eq!(store.history("2728").len(), HISTORY_LIMIT);
    assert_eq!(store.registered_procedures(), 1);
    assert_eq!(feeder.procedure().name(), "emojitrack_update");
    assert_eq!(store.outstanding_checkouts(), 0);
    assert!(store.published().is_empty(), "seeding must not publish");
}

#[tokio::test]
async fn empty_snapshot_fails_before_any_store_io() {
    let store = MemoryStore::new();
    let result = Feeder::new(store.clone(), snapshot(&[]), false).await;

    assert!(matches!(
        result,
        Err(FeederError::Config {
            source: ConfigError::EmptyRanking
        })
    ));
    assert_eq!(store.checkouts(), 0);
}

#[tokio::test]
async fn all_zero_weights_fail_weighted_construction() {
    let store = MemoryStore::new();
    let result = Feeder::new(store.clone(), snapshot(&[("🔥", "1F525", 0)]), true).await;
    assert!(matches!(
        result,
        Err(FeederError::Config {
            source: ConfigError::ZeroWeights
        })
    ));
}

#[tokio::test]
async fn each_seed_phase_failure_is_reported() {
    let cases = [
        (Fault::Checkout, SeedPhase::Checkout),
        (Fault::SeedScores, SeedPhase::Scores),
        (Fault::SeedHistory, SeedPhase::History),
        (Fault::Register, SeedPhase::Registration),
    ];

    for (fault, phase) in cases {
        let store = MemoryStore::new();
        store.inject(fault);
        let result = Feeder::new(store.clone(), single_glyph(), true).await;

        let err = result.err().expect("seeding must fail");
        assert_eq!(err.phase(), Some(phase), "fault {fault:?}");
        assert_eq!(store.outstanding_checkouts(), 0, "fault {fault:?} leaked a checkout");
        assert_eq!(store.registered_procedures(), 0);
    }
}

// =============================================================================
// Single updates
// =============================================================================

#[tokio::test]
async fn update_applies_protocol_effects() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;
    let seeded_history = store.history("1F525");

    let outcome = feeder.update().await.expect("update succeeds");

    assert_eq!(outcome.glyph_id, "1F525");
    assert_eq!(store.score("1F525"), Some(8));

    let history = store.history("1F525");
    assert_eq!(history.len(), HISTORY_LIMIT);
    let head: UpdateRecord = serde_json::from_str(&history[0]).expect("record json");
    assert_eq!(head.id, outcome.record_id);
    assert!(head.text.ends_with("🔥"));
    assert_eq!(&history[1..], &seeded_history[..HISTORY_LIMIT - 1]);

    assert_eq!(store.published_on(SCORE_CHANNEL), vec![String::from("1F525")]);
    assert_eq!(store.published_on(&record_channel("1F525")), vec![history[0].clone()]);
    assert_eq!(store.outstanding_checkouts(), 0);
}

#[tokio::test]
async fn repeated_updates_keep_latest_ten_in_order() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), false).await;

    let mut ids = Vec::new();
    for _ in 0..25 {
        ids.push(feeder.update().await.expect("update succeeds").record_id);
    }

    let history: Vec<String> = store
        .history("1F525")
        .iter()
        .map(|raw| serde_json::from_str::<UpdateRecord>(raw).expect("record json").id)
        .collect();
    let expected: Vec<String> = ids.iter().rev().take(HISTORY_LIMIT).cloned().collect();
    assert_eq!(history, expected);
    assert_eq!(store.score("1F525"), Some(7 + 25));
}

#[tokio::test]
async fn sequential_record_ids_step_by_42() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;

    let a: u64 = feeder.update().await.unwrap().record_id.parse().unwrap();
    let b: u64 = feeder.update().await.unwrap().record_id.parse().unwrap();
    assert_eq!(b, a + RECORD_ID_STEP);
}

#[tokio::test]
async fn failed_updates_release_their_connection() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;

    store.inject(Fault::Invoke);
    let err = feeder.update().await.expect_err("invoke fails");
    assert!(matches!(err, UpdateError::Invoke { ref glyph_id, .. } if glyph_id == "1F525"));
    assert_eq!(store.outstanding_checkouts(), 0);

    store.inject(Fault::Checkout);
    let err = feeder.update().await.expect_err("checkout fails");
    assert!(matches!(err, UpdateError::Checkout { .. }));
    assert!(!err.is_fatal());
    assert_eq!(store.outstanding_checkouts(), 0);
    assert_eq!(store.score("1F525"), Some(7));
}

#[tokio::test]
async fn diagnostics_sink_is_swappable() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;

    feeder.update().await.expect("update with default sink");

    let sink = Arc::new(RecordingSink::default());
    feeder.set_diagnostics(sink.clone());
    let outcome = feeder.update().await.expect("update with recording sink");

    let events = sink.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![DiagnosticEvent::UpdateSent {
            glyph_id: String::from("1F525"),
            glyph: String::from("🔥"),
            name: String::from("TEST GLYPH"),
            record_id: outcome.record_id,
        }]
    );
}

// =============================================================================
// Scheduled loop
// =============================================================================

#[tokio::test(start_paused = true)]
async fn run_updates_on_schedule_until_cancelled() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;
    let token = CancellationToken::new();

    let mut run = feeder.run(token.clone(), PERIOD);

    // First tick is a full period out.
    tokio::time::sleep(PERIOD / 2).await;
    assert_eq!(store.invocations(), 0);

    tokio::time::sleep(PERIOD * 5).await;
    token.cancel();
    let summary = run.task.await.expect("task joins");

    assert!((4..=6).contains(&summary.updates_sent), "{summary:?}");
    assert_eq!(summary.updates_failed, 0);
    assert_eq!(store.invocations(), summary.updates_sent);

    let errors = drain(&mut run.errors).await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], UpdateError::Cancelled));

    // Nothing is scheduled after cancellation.
    let after = store.invocations();
    tokio::time::sleep(PERIOD * 10).await;
    assert_eq!(store.invocations(), after);
    assert_eq!(store.outstanding_checkouts(), 0);
}

#[tokio::test(start_paused = true)]
async fn per_update_errors_do_not_stop_the_loop() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;
    let token = CancellationToken::new();
    let mut run = feeder.run(token.clone(), PERIOD);

    store.inject(Fault::Invoke);
    tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
    let first = run.errors.recv().await.expect("error reported");
    assert!(matches!(first, UpdateError::Invoke { .. }));

    store.clear(Fault::Invoke);
    tokio::time::sleep(PERIOD * 3).await;
    token.cancel();
    let summary = run.task.await.expect("task joins");

    assert!(summary.updates_failed >= 2, "{summary:?}");
    assert!(summary.updates_sent >= 2, "{summary:?}");
    assert!(store.score("1F525").unwrap() > 7);
}

#[tokio::test(start_paused = true)]
async fn full_error_conduit_drops_instead_of_blocking() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;
    store.inject(Fault::Invoke);

    let token = CancellationToken::new();
    let mut run = feeder.run(token.clone(), PERIOD);

    // Nobody reads errors while 30 ticks fail.
    tokio::time::sleep(PERIOD * 30 + PERIOD / 2).await;
    token.cancel();
    let summary = run.task.await.expect("task joins");

    assert_eq!(summary.updates_failed, 30, "ticks kept firing: {summary:?}");
    assert_eq!(store.invocations(), 30);

    // The conduit kept the first errors, then dropped the rest plus the
    // cancellation notice, and is now closed.
    let errors = drain(&mut run.errors).await;
    assert_eq!(errors.len(), ERROR_CONDUIT_CAPACITY);
    assert!(errors.iter().all(|e| matches!(e, UpdateError::Invoke { .. })));
    let dropped = summary.updates_failed + 1 - ERROR_CONDUIT_CAPACITY as u64;
    assert_eq!(summary.errors_dropped, dropped);
}

#[tokio::test(start_paused = true)]
async fn cancelling_before_first_tick_sends_nothing() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, single_glyph(), true).await;
    let token = CancellationToken::new();
    token.cancel();

    let mut run = feeder.run(token, PERIOD);
    let summary = run.task.await.expect("task joins");

    assert_eq!(summary.updates_sent, 0);
    assert_eq!(store.invocations(), 0);
    let errors = drain(&mut run.errors).await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], UpdateError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn manual_updates_run_alongside_the_loop() {
    let store = MemoryStore::new();
    let feeder = seeded(&store, snapshot(&[("🔥", "1F525", 3), ("✨", "2728", 1)]), true).await;
    let token = CancellationToken::new();
    let run = feeder.run(token.clone(), Duration::from_millis(1));

    let manual: Vec<_> = (0..4)
        .map(|_| {
            let feeder = Arc::clone(&feeder);
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..25 {
                    ids.push(feeder.update().await.expect("update succeeds").record_id);
                }
                ids
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in manual {
        for id in handle.await.expect("task joins") {
            assert!(ids.insert(id), "record id issued twice");
        }
    }

    token.cancel();
    let summary = run.task.await.expect("task joins");
    let total = 100 + summary.updates_sent;
    assert_eq!(store.invocations(), total);
    assert_eq!(
        store.score("1F525").unwrap() + store.score("2728").unwrap(),
        4 + total
    );
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn weighted_feed_follows_seed_scores() {
    let store = MemoryStore::new();
    let snap = snapshot(&[("🔥", "A", 10), ("✨", "B", 0), ("💀", "C", 5)]);
    let feeder = seeded(&store, snap, true).await;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for _ in 0..1_000 {
        let outcome = feeder.update().await.expect("update succeeds");
        *counts.entry(outcome.glyph_id).or_default() += 1;
    }

    assert_eq!(counts.get("B"), None);
    assert_eq!(store.score("B"), Some(0));

    let a = counts["A"] as f64;
    let c = counts["C"] as f64;
    let ratio = a / c;
    assert!((1.5..=2.7).contains(&ratio), "ratio {ratio} not roughly 2");
    assert_eq!(store.score("A"), Some(10 + counts["A"]));
    assert_eq!(store.score("C"), Some(5 + counts["C"]));
}
