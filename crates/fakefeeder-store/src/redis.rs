//! Redis (or any Redis-compatible server such as `Dragonfly`) backing for
//! the feeder.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `emojitrack_score` | Sorted set | Score per glyph id |
//! | `emojitrack_tweets_{id}` | List | Latest 10 records, most recent first |
//! | `stream.score_updates` | Channel | Glyph id per update |
//! | `stream.tweet_updates.{id}` | Channel | Record per update |
//!
//! Seeding runs as `MULTI`/`EXEC` batches. Updates run the registered Lua
//! procedure with `EVALSHA`, so the script body crosses the wire only once.

use fakefeeder_core::keys::{HISTORY_LIMIT, SCORE_KEY, history_key};
use fakefeeder_core::protocol::{
    HistoryBatch, ProcedureHandle, SUCCESS_SENTINEL, StoredProcedure,
};
use fakefeeder_core::ranking::RankingEntry;
use fakefeeder_core::store::{ConnectionProvider, StoreConnection};
use fakefeeder_core::StoreError;
use fred::prelude::*;
use fred::types::Value;

use crate::error::DbError;

/// Last list index kept by `LTRIM` during seeding.
#[allow(clippy::cast_possible_wrap, clippy::arithmetic_side_effects)] // HISTORY_LIMIT is 10
const HISTORY_LAST_INDEX: i64 = HISTORY_LIMIT as i64 - 1;

/// Pool of multiplexed connections to a Redis instance.
///
/// Cloning shares the pool.
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl RedisPool {
    /// Connect `size` clients to the Redis server at `url`.
    ///
    /// The URL follows the Redis URL scheme, credentials included:
    /// `redis://[:password@]host:port[/db]`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed or `size` is 0.
    /// Returns [`DbError::Redis`] if the connection fails.
    pub async fn connect(url: &str, size: usize) -> Result<Self, DbError> {
        if size == 0 {
            return Err(DbError::Config(String::from("pool size must be at least 1")));
        }
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Redis URL: {e}")))?;

        let pool = Builder::from_config(config).build_pool(size)?;
        pool.init().await?;

        tracing::info!(size, "Connected to Redis");
        Ok(Self { pool })
    }

    /// Current score for `glyph_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Redis`] if the read fails.
    pub async fn score(&self, glyph_id: &str) -> Result<Option<f64>, DbError> {
        let score: Option<f64> = self.pool.next().zscore(SCORE_KEY, glyph_id).await?;
        Ok(score)
    }

    /// History list for `glyph_id`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Redis`] if the read fails.
    pub async fn history(&self, glyph_id: &str) -> Result<Vec<String>, DbError> {
        let records: Vec<String> = self
            .pool
            .next()
            .lrange(history_key(glyph_id), 0, -1)
            .await?;
        Ok(records)
    }

    /// Flush all keys from the Redis instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Redis`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.pool.next().flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Pool`].
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }
}

impl ConnectionProvider for RedisPool {
    type Connection = RedisConnection;

    async fn checkout(&self) -> Result<RedisConnection, StoreError> {
        let client = self.pool.next();
        if !client.is_connected() {
            return Err(StoreError::Unavailable(format!(
                "client {} is not connected",
                client.id()
            )));
        }
        Ok(RedisConnection {
            client: client.clone(),
        })
    }
}

/// One client checked out of a [`RedisPool`].
///
/// Clients are multiplexed and shared, so dropping this releases nothing
/// beyond the handle itself.
pub struct RedisConnection {
    client: Client,
}

impl StoreConnection for RedisConnection {
    async fn seed_scores(&mut self, entries: &[RankingEntry]) -> Result<(), StoreError> {
        #[allow(clippy::cast_precision_loss)] // sorted-set scores are doubles server-side
        let members: Vec<(f64, String)> = entries
            .iter()
            .map(|e| (e.score as f64, e.id.clone()))
            .collect();
        if members.is_empty() {
            return Ok(());
        }

        let trx = self.client.multi();
        let _: () = trx
            .zadd(SCORE_KEY, None, None, false, false, members)
            .await
            .map_err(DbError::from)?;
        let _: Value = trx.exec(true).await.map_err(DbError::from)?;
        Ok(())
    }

    async fn seed_history(&mut self, batches: &[HistoryBatch]) -> Result<(), StoreError> {
        let trx = self.client.multi();
        for batch in batches.iter().filter(|b| !b.records.is_empty()) {
            let key = history_key(&batch.glyph_id);
            let _: () = trx
                .lpush(key.as_str(), batch.records.clone())
                .await
                .map_err(DbError::from)?;
            let _: () = trx
                .ltrim(key.as_str(), 0, HISTORY_LAST_INDEX)
                .await
                .map_err(DbError::from)?;
        }
        let _: Value = trx.exec(true).await.map_err(DbError::from)?;
        Ok(())
    }

    async fn register(
        &mut self,
        procedure: &StoredProcedure,
    ) -> Result<ProcedureHandle, StoreError> {
        let digest: String = self
            .client
            .script_load(procedure.body)
            .await
            .map_err(DbError::from)?;
        tracing::debug!(procedure = %procedure, digest, "Loaded update procedure");
        Ok(ProcedureHandle::new(procedure, digest))
    }

    async fn invoke(
        &mut self,
        handle: &ProcedureHandle,
        glyph_id: &str,
        record: &str,
    ) -> Result<(), StoreError> {
        let reply: i64 = self
            .client
            .evalsha(
                handle.digest(),
                Vec::<String>::new(),
                vec![glyph_id.to_owned(), record.to_owned()],
            )
            .await
            .map_err(DbError::from)?;

        if reply == SUCCESS_SENTINEL {
            Ok(())
        } else {
            Err(StoreError::UnexpectedReply(reply.to_string()))
        }
    }
}
