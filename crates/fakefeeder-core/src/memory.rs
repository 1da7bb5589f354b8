//! In-process store implementing the feeder's store traits.
//!
//! [`MemoryStore`] applies the update protocol under one lock, so it is atomic
//! by construction. It records every publish instead of delivering it, counts
//! checkouts so tests can prove connections are always released, and can be
//! told to fail any individual operation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::keys::{HISTORY_LIMIT, SCORE_CHANNEL, history_key, record_channel};
use crate::protocol::{
    HistoryBatch, ProcedureHandle, StoredProcedure, SUCCESS_SENTINEL, UpdateProtocol,
};
use crate::ranking::RankingEntry;
use crate::store::{ConnectionProvider, StoreConnection};

/// An operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fault {
    /// [`ConnectionProvider::checkout`].
    Checkout,
    /// [`StoreConnection::seed_scores`].
    SeedScores,
    /// [`StoreConnection::seed_history`].
    SeedHistory,
    /// [`StoreConnection::register`].
    Register,
    /// [`StoreConnection::invoke`].
    Invoke,
}

/// A message captured from a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Channel the message was published on.
    pub channel: String,
    /// Message payload.
    pub payload: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    scores: BTreeMap<String, u64>,
    lists: BTreeMap<String, VecDeque<String>>,
    published: Vec<Published>,
    procedures: BTreeMap<String, StoredProcedure>,
    faults: BTreeSet<Fault>,
    outstanding: usize,
    checkouts: u64,
    invocations: u64,
}

impl MemoryState {
    fn check(&self, fault: Fault) -> Result<(), StoreError> {
        if self.faults.contains(&fault) {
            return Err(StoreError::Unavailable(format!("injected {fault:?} fault")));
        }
        Ok(())
    }

    fn push_front_capped(&mut self, key: String, record: &str) {
        let list = self.lists.entry(key).or_default();
        list.push_front(record.to_owned());
        list.truncate(HISTORY_LIMIT);
    }

    fn publish(&mut self, channel: String, payload: &str) {
        self.published.push(Published {
            channel,
            payload: payload.to_owned(),
        });
    }

    fn apply_update(&mut self, glyph_id: &str, record: &str) -> i64 {
        let score = self.scores.entry(glyph_id.to_owned()).or_insert(0);
        *score = score.saturating_add(1);
        self.publish(SCORE_CHANNEL.to_owned(), glyph_id);
        self.push_front_capped(history_key(glyph_id), record);
        self.publish(record_channel(glyph_id), record);
        SUCCESS_SENTINEL
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// An empty store with no faults.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `fault` fail until cleared.
    pub fn inject(&self, fault: Fault) {
        self.lock().faults.insert(fault);
    }

    /// Stop failing `fault`.
    pub fn clear(&self, fault: Fault) {
        self.lock().faults.remove(&fault);
    }

    /// Current score for `glyph_id`.
    pub fn score(&self, glyph_id: &str) -> Option<u64> {
        self.lock().scores.get(glyph_id).copied()
    }

    /// History list for `glyph_id`, most recent first.
    pub fn history(&self, glyph_id: &str) -> Vec<String> {
        self.lock()
            .lists
            .get(&history_key(glyph_id))
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every message published so far, in order.
    pub fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }

    /// Payloads published on `channel`, in order.
    pub fn published_on(&self, channel: &str) -> Vec<String> {
        self.lock()
            .published
            .iter()
            .filter(|p| p.channel == channel)
            .map(|p| p.payload.clone())
            .collect()
    }

    /// Connections currently checked out.
    pub fn outstanding_checkouts(&self) -> usize {
        self.lock().outstanding
    }

    /// Successful checkouts since creation.
    pub fn checkouts(&self) -> u64 {
        self.lock().checkouts
    }

    /// Procedure invocations attempted since creation, failed ones included.
    pub fn invocations(&self) -> u64 {
        self.lock().invocations
    }

    /// Number of registered procedures.
    pub fn registered_procedures(&self) -> usize {
        self.lock().procedures.len()
    }
}

/// Connection checked out of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    store: MemoryStore,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
    }
}

impl ConnectionProvider for MemoryStore {
    type Connection = MemoryConnection;

    async fn checkout(&self) -> Result<MemoryConnection, StoreError> {
        {
            let mut state = self.lock();
            state.check(Fault::Checkout)?;
            state.outstanding = state.outstanding.saturating_add(1);
            state.checkouts = state.checkouts.saturating_add(1);
        }
        Ok(MemoryConnection {
            store: self.clone(),
        })
    }
}

impl StoreConnection for MemoryConnection {
    async fn seed_scores(&mut self, entries: &[RankingEntry]) -> Result<(), StoreError> {
        let mut state = self.store.lock();
        state.check(Fault::SeedScores)?;
        for entry in entries {
            state.scores.insert(entry.id.clone(), entry.score);
        }
        Ok(())
    }

    async fn seed_history(&mut self, batches: &[HistoryBatch]) -> Result<(), StoreError> {
        let mut state = self.store.lock();
        state.check(Fault::SeedHistory)?;
        for batch in batches {
            for record in &batch.records {
                state.push_front_capped(history_key(&batch.glyph_id), record);
            }
        }
        Ok(())
    }

    async fn register(
        &mut self,
        procedure: &StoredProcedure,
    ) -> Result<ProcedureHandle, StoreError> {
        let mut state = self.store.lock();
        state.check(Fault::Register)?;
        let digest = procedure.to_string();
        state.procedures.insert(digest.clone(), *procedure);
        Ok(ProcedureHandle::new(procedure, digest))
    }

    async fn invoke(
        &mut self,
        handle: &ProcedureHandle,
        glyph_id: &str,
        record: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.store.lock();
        state.invocations = state.invocations.saturating_add(1);
        state.check(Fault::Invoke)?;

        let procedure = state
            .procedures
            .get(handle.digest())
            .copied()
            .ok_or_else(|| StoreError::UnknownProcedure(handle.to_string()))?;
        if procedure != UpdateProtocol::procedure() {
            return Err(StoreError::UnknownProcedure(format!(
                "{procedure} cannot be executed in memory"
            )));
        }

        match state.apply_update(glyph_id, record) {
            SUCCESS_SENTINEL => Ok(()),
            other => Err(StoreError::UnexpectedReply(other.to_string())),
        }
    }
}
