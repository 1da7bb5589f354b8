//! Store abstraction used by the feeder.
//!
//! A [`ConnectionProvider`] hands out [`StoreConnection`]s. The feeder checks
//! out one connection per operation and lets it drop when the operation ends,
//! on success and failure alike; implementations release pooled resources in
//! `Drop`, so an early `?` return can never leak a checkout.

use std::future::Future;

use crate::error::StoreError;
use crate::protocol::{HistoryBatch, ProcedureHandle, StoredProcedure};
use crate::ranking::RankingEntry;

/// One checked-out store connection.
pub trait StoreConnection: Send {
    /// Set each entry's score verbatim in one batched transaction.
    fn seed_scores(
        &mut self,
        entries: &[RankingEntry],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Push every batch's records onto its history list, then trim the list
    /// to the history limit, in one batched transaction.
    fn seed_history(
        &mut self,
        batches: &[HistoryBatch],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Register `procedure` with the store and return its handle.
    fn register(
        &mut self,
        procedure: &StoredProcedure,
    ) -> impl Future<Output = Result<ProcedureHandle, StoreError>> + Send;

    /// Run a registered procedure atomically with `(glyph_id, record)`.
    ///
    /// Resolves once the store has answered; anything other than the success
    /// sentinel is an error.
    fn invoke(
        &mut self,
        handle: &ProcedureHandle,
        glyph_id: &str,
        record: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Source of [`StoreConnection`]s.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Connection type handed out by this provider.
    type Connection: StoreConnection;

    /// Check out a connection. Dropping it returns it to the provider.
    fn checkout(&self) -> impl Future<Output = Result<Self::Connection, StoreError>> + Send;
}
