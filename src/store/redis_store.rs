// src/store/redis_store.rs
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Script};
use tracing::debug;

use super::scripts::{COUNT_WITHIN_LEVEL_SCRIPT, LENGTHS_SCRIPT, POP_SCRIPT, PUSH_SCRIPT};
use super::{LevelPosition, LevelStore};
use crate::config::check_level;
use crate::error::{QueueError, Result};
use crate::utils::constants::{MAX_SEQUENCE, SUFFIX_COUNT, SUFFIX_COUNT_MAP, SUFFIX_LEVEL_MAP};
use crate::utils::rdconfig::get_redis_connection;

/// Key names of one queue instance.
#[derive(Clone, Debug)]
pub struct QueueKeys {
    base_key: String,
    levels: Vec<String>,
}

impl QueueKeys {
    pub fn new(base_key: &str, max_level: i64) -> Self {
        let levels = (1..=max_level)
            .map(|level| format!("{{{base_key}}}:{level}"))
            .collect();
        Self {
            base_key: base_key.to_string(),
            levels,
        }
    }

    /// List key of `level` (1-based). The level must already be validated.
    pub fn level(&self, level: i64) -> &str {
        &self.levels[level as usize - 1]
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn count(&self, level: i64) -> String {
        format!("{{{}}}:{SUFFIX_COUNT}:{level}", self.base_key)
    }

    pub fn count_map(&self) -> String {
        format!("{{{}}}:{SUFFIX_COUNT_MAP}", self.base_key)
    }

    pub fn level_map(&self) -> String {
        format!("{{{}}}:{SUFFIX_LEVEL_MAP}", self.base_key)
    }
}

/// Queue storage on Redis; every multi-key step runs as one Lua script.
pub struct RedisStore {
    conn: MultiplexedConnection,
    keys: QueueKeys,
    max_level: i64,
    push_script: Script,
    pop_script: Script,
    count_script: Script,
    lengths_script: Script,
}

impl RedisStore {
    pub fn new(conn: MultiplexedConnection, base_key: &str, max_level: i64) -> Self {
        Self {
            conn,
            keys: QueueKeys::new(base_key, max_level),
            max_level,
            push_script: Script::new(PUSH_SCRIPT),
            pop_script: Script::new(POP_SCRIPT),
            count_script: Script::new(COUNT_WITHIN_LEVEL_SCRIPT),
            lengths_script: Script::new(LENGTHS_SCRIPT),
        }
    }

    pub async fn connect(redis_url: &str, base_key: &str, max_level: i64) -> Result<Self> {
        let conn = get_redis_connection(redis_url).await?;
        debug!(base_key, max_level, "connected queue store");
        Ok(Self::new(conn, base_key, max_level))
    }

    pub fn keys(&self) -> &QueueKeys {
        &self.keys
    }

    /// Deletes every key of this queue. Meant for tests and tooling.
    pub async fn purge(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = self.keys.levels().to_vec();
        keys.extend((1..=self.max_level).map(|level| self.keys.count(level)));
        keys.push(self.keys.count_map());
        keys.push(self.keys.level_map());
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }
}

#[async_trait]
impl LevelStore for RedisStore {
    fn max_level(&self) -> i64 {
        self.max_level
    }

    async fn push(&self, level: i64, id: &str, payload: &str) -> Result<i64> {
        check_level(level, self.max_level)?;
        let mut conn = self.conn.clone();
        let seq: i64 = self
            .push_script
            .key(self.keys.count(level))
            .key(self.keys.level(level))
            .key(self.keys.count_map())
            .key(self.keys.level_map())
            .arg(payload)
            .arg(id)
            .arg(level)
            .arg(MAX_SEQUENCE)
            .invoke_async(&mut conn)
            .await?;
        Ok(seq)
    }

    async fn pop(&self) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let mut invocation = self.pop_script.prepare_invoke();
        for key in self.keys.levels() {
            invocation.key(key);
        }
        invocation.key(self.keys.count_map()).key(self.keys.level_map());
        let payload: Option<String> = invocation.invoke_async(&mut conn).await?;
        Ok(payload)
    }

    async fn pull(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(self.keys.count_map(), id).await?;
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let live: bool = conn.hexists(self.keys.count_map(), id).await?;
        Ok(live)
    }

    async fn count_within_level(&self, id: &str) -> Result<Option<LevelPosition>> {
        let mut conn = self.conn.clone();
        let mut invocation = self.count_script.prepare_invoke();
        invocation.key(self.keys.level_map()).key(self.keys.count_map());
        for key in self.keys.levels() {
            invocation.key(key);
        }
        invocation.arg(id);
        let reply: Option<(i64, i64)> = invocation.invoke_async(&mut conn).await?;
        Ok(reply.map(|(level, ahead)| LevelPosition { level, ahead }))
    }

    async fn len(&self, level: i64) -> Result<i64> {
        check_level(level, self.max_level)?;
        let mut conn = self.conn.clone();
        let len: i64 = conn.llen(self.keys.level(level)).await?;
        Ok(len)
    }

    async fn lengths(&self) -> Result<Vec<i64>> {
        let mut conn = self.conn.clone();
        let mut invocation = self.lengths_script.prepare_invoke();
        for key in self.keys.levels() {
            invocation.key(key);
        }
        let lengths: Vec<i64> = invocation.invoke_async(&mut conn).await?;
        if lengths.len() as i64 != self.max_level {
            return Err(QueueError::UnexpectedReply(format!(
                "expected {} level lengths, got {}",
                self.max_level,
                lengths.len()
            )));
        }
        Ok(lengths)
    }
}
