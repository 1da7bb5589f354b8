//! Fake Emojitracker feeder entry point.
//!
//! Emulates the real feeder without a live firehose: seeds a Redis-compatible
//! store from a ranking snapshot, then publishes synthetic updates at a fixed
//! rate until interrupted.
//!
//! # Architecture
//!
//! ```text
//! config --> RedisPool --> Feeder (seed) --> run loop --> EVALSHA per tick
//!                                               |
//!                                               +--> error conduit --> warn!
//! ```
//!
//! Ctrl-C cancels the loop; the process exits once it has stopped and the
//! run summary has been logged.

mod config;
mod error;

use std::sync::Arc;

use fakefeeder_core::{
    CancellationToken, Feeder, RankingSnapshot, RunHandle, Synthesizer, TracingSink,
    UpdateError,
};
use fakefeeder_store::RedisPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::FeederConfig;
use crate::error::AppError;

/// Application entry point.
///
/// Initializes logging, loads configuration, connects the Redis pool, seeds
/// the store, then runs the update loop until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration, connection or seeding fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("fakefeeder starting");

    run().await?;
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let config = FeederConfig::load()?;
    info!(
        target_url = config.redacted_target(),
        rate = config.rate,
        weighted = config.weighted,
        pool_size = config.pool_size,
        "configuration loaded"
    );

    let snapshot = match &config.snapshot_path {
        Some(path) => RankingSnapshot::from_file(path)?,
        None => RankingSnapshot::embedded()?,
    };
    info!(
        glyphs = snapshot.len(),
        total_score = snapshot.total_score(),
        "ranking snapshot loaded"
    );

    let pool = RedisPool::connect(&config.target, config.pool_size).await?;

    let mut synthesizer = Synthesizer::new();
    if let Some(avatar_url) = &config.avatar_url {
        synthesizer = synthesizer.with_avatar_url(avatar_url.clone());
    }

    let feeder = Arc::new(
        Feeder::with_synthesizer(pool, snapshot, config.weighted, synthesizer).await?,
    );
    if config.verbose {
        feeder.set_diagnostics(Arc::new(TracingSink::loud()));
    } else {
        feeder.set_diagnostics(Arc::new(TracingSink::new()));
    }

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received, stopping feeder"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C, stopping feeder"),
        }
        shutdown.cancel();
    });

    let period = config.period();
    info!(period = ?period, "publishing updates");
    let RunHandle { mut errors, task } = feeder.run(token, period);

    while let Some(err) = errors.recv().await {
        match err {
            UpdateError::Cancelled => info!("feeder cancelled"),
            err => warn!(error = %err, "update failed"),
        }
    }

    let summary = task.await?;
    info!(
        updates_sent = summary.updates_sent,
        updates_failed = summary.updates_failed,
        errors_dropped = summary.errors_dropped,
        last_record_id = feeder.synthesizer().last_id(),
        "fakefeeder stopped"
    );
    Ok(())
}
