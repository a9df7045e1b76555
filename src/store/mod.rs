// src/store/mod.rs
//! Atomic level-partitioned storage behind the queue engine.
//!
//! Every method is one indivisible step against the backing store: callers
//! never observe a half-applied push, and two pops never share a record.

use async_trait::async_trait;

use crate::error::Result;

pub mod memory;
pub mod redis_store;
mod scripts;

pub use self::memory::MemoryStore;
pub use self::redis_store::{QueueKeys, RedisStore};

/// Where a live element sits inside its own level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelPosition {
    pub level: i64,
    /// Live records in the same level with a smaller sequence number.
    pub ahead: i64,
}

#[async_trait]
pub trait LevelStore: Send + Sync {
    /// Number of levels the store was laid out for.
    fn max_level(&self) -> i64;

    /// Appends `payload` to `level` and marks `id` live. Returns the issued sequence number.
    /// The level is validated by the caller.
    async fn push(&self, level: i64, id: &str, payload: &str) -> Result<i64>;

    /// Removes and returns the first live payload, highest priority level first.
    /// Dead records met on the way are purged.
    async fn pop(&self) -> Result<Option<String>>;

    /// Drops `id` from the existence map only.
    async fn pull(&self, id: &str) -> Result<()>;

    async fn contains(&self, id: &str) -> Result<bool>;

    /// `None` when the id has no level or is no longer live.
    async fn count_within_level(&self, id: &str) -> Result<Option<LevelPosition>>;

    /// Physical length of one level list, dead records included.
    async fn len(&self, level: i64) -> Result<i64>;

    /// Physical length of every level, read in one atomic step.
    async fn lengths(&self) -> Result<Vec<i64>>;
}
