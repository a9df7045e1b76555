// src/store/memory.rs
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{LevelPosition, LevelStore};
use crate::config::check_level;
use crate::error::{QueueError, Result};
use crate::utils::constants::MAX_SEQUENCE;

#[derive(Debug)]
struct Record {
    seq: i64,
    id: String,
    payload: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    levels: Vec<VecDeque<Record>>,
    counters: Vec<i64>,
    count_map: HashMap<String, i64>,
    level_map: HashMap<String, i64>,
}

impl MemoryState {
    // Sequences are per level, so the level must match as well.
    fn is_live(&self, record: &Record, level: i64) -> bool {
        self.count_map.get(&record.id) == Some(&record.seq)
            && self.level_map.get(&record.id) == Some(&level)
    }
}

/// In-process store with the same semantics as the Redis scripts.
/// Each operation holds the state lock for its whole step.
#[derive(Debug)]
pub struct MemoryStore {
    max_level: i64,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(max_level: i64) -> Self {
        let levels = max_level.max(0) as usize;
        Self {
            max_level,
            state: Mutex::new(MemoryState {
                levels: (0..levels).map(|_| VecDeque::new()).collect(),
                counters: vec![0; levels],
                ..MemoryState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LevelStore for MemoryStore {
    fn max_level(&self) -> i64 {
        self.max_level
    }

    async fn push(&self, level: i64, id: &str, payload: &str) -> Result<i64> {
        check_level(level, self.max_level)?;
        let idx = level as usize - 1;
        let mut state = self.state();
        if state.counters[idx] >= MAX_SEQUENCE {
            return Err(QueueError::UnexpectedReply(format!(
                "sequence exhausted for level {level}"
            )));
        }
        state.counters[idx] += 1;
        let seq = state.counters[idx];
        state.levels[idx].push_back(Record {
            seq,
            id: id.to_string(),
            payload: payload.to_string(),
        });
        state.count_map.insert(id.to_string(), seq);
        state.level_map.insert(id.to_string(), level);
        Ok(seq)
    }

    async fn pop(&self) -> Result<Option<String>> {
        let mut state = self.state();
        for idx in 0..state.levels.len() {
            while let Some(record) = state.levels[idx].pop_front() {
                if state.is_live(&record, idx as i64 + 1) {
                    state.count_map.remove(&record.id);
                    state.level_map.remove(&record.id);
                    return Ok(Some(record.payload));
                }
            }
        }
        Ok(None)
    }

    async fn pull(&self, id: &str) -> Result<()> {
        self.state().count_map.remove(id);
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.state().count_map.contains_key(id))
    }

    async fn count_within_level(&self, id: &str) -> Result<Option<LevelPosition>> {
        let state = self.state();
        let (Some(&level), Some(&target)) = (state.level_map.get(id), state.count_map.get(id)) else {
            return Ok(None);
        };
        let list = state
            .levels
            .get(level as usize - 1)
            .ok_or_else(|| QueueError::UnexpectedReply(format!("level {level} out of range for {id}")))?;
        let ahead = list
            .iter()
            .take_while(|record| record.seq < target)
            .filter(|record| state.is_live(record, level))
            .count() as i64;
        Ok(Some(LevelPosition { level, ahead }))
    }

    async fn len(&self, level: i64) -> Result<i64> {
        check_level(level, self.max_level)?;
        Ok(self.state().levels[level as usize - 1].len() as i64)
    }

    async fn lengths(&self) -> Result<Vec<i64>> {
        Ok(self
            .state()
            .levels
            .iter()
            .map(|list| list.len() as i64)
            .collect())
    }
}
