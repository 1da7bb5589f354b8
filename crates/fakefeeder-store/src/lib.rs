//! Redis-compatible store for the Emojitracker fake feeder.
//!
//! Implements the core's [`ConnectionProvider`] and [`StoreConnection`]
//! traits on top of a [`fred`] connection pool. Works against Redis and
//! `Dragonfly` alike.
//!
//! # Modules
//!
//! - [`redis`] -- [`RedisPool`] and its connections
//! - [`error`] -- Shared error types
//!
//! [`ConnectionProvider`]: fakefeeder_core::ConnectionProvider
//! [`StoreConnection`]: fakefeeder_core::StoreConnection

pub mod error;
pub mod redis;

// Re-export primary types for convenience.
pub use error::DbError;
pub use redis::{RedisConnection, RedisPool};
